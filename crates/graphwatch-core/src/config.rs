//! Connection configuration for the Bolt backend.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`GRAPHWATCH__` prefix)
//! 2. Config file (`graphwatch.toml`)
//! 3. Defaults (bolt://localhost:7687, user neo4j)

use serde::{Deserialize, Serialize};

/// URI scheme for a Neo4j connection.
///
/// The `+s` variants enable TLS against a CA-signed certificate, `+ssc`
/// accepts self-signed certificates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Scheme {
    #[serde(rename = "neo4j")]
    Neo4j,
    #[serde(rename = "neo4j+s")]
    Neo4jS,
    #[serde(rename = "neo4j+ssc")]
    Neo4jSsc,
    #[default]
    #[serde(rename = "bolt")]
    Bolt,
    #[serde(rename = "bolt+s")]
    BoltS,
    #[serde(rename = "bolt+ssc")]
    BoltSsc,
}

/// All supported schemes, in the order a login surface would list them.
pub const SCHEMES: [Scheme; 6] = [
    Scheme::Neo4j,
    Scheme::Neo4jS,
    Scheme::Neo4jSsc,
    Scheme::Bolt,
    Scheme::BoltS,
    Scheme::BoltSsc,
];

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Neo4j => "neo4j",
            Scheme::Neo4jS => "neo4j+s",
            Scheme::Neo4jSsc => "neo4j+ssc",
            Scheme::Bolt => "bolt",
            Scheme::BoltS => "bolt+s",
            Scheme::BoltSsc => "bolt+ssc",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SCHEMES
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| format!("unknown scheme: {s}"))
    }
}

/// Credentials and endpoint used to establish a connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectConfig {
    #[serde(default)]
    pub scheme: Scheme,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Ambient default database published to the registry on establish.
    /// `None` leaves database selection to the server.
    #[serde(default)]
    pub database: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    7687
}

fn default_username() -> String {
    "neo4j".to_string()
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            database: None,
        }
    }
}

impl ConnectConfig {
    /// Bolt URI in the `scheme://host:port` form the driver expects.
    pub fn uri(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Load from `<file_prefix>.toml` and `GRAPHWATCH__`-prefixed
    /// environment variables, falling back to defaults.
    pub fn load(file_prefix: &str) -> Self {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GRAPHWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build();

        match cfg.and_then(|c| c.get::<ConnectConfig>("connection")) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "no connection config found, using defaults");
                ConnectConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ConnectConfig::default();
        assert_eq!(config.scheme, Scheme::Bolt);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 7687);
        assert_eq!(config.username, "neo4j");
        assert_eq!(config.database, None);
    }

    #[test]
    fn uri_formatting() {
        let config = ConnectConfig {
            scheme: Scheme::Neo4jS,
            host: "db.example.com".into(),
            port: 7999,
            ..Default::default()
        };
        assert_eq!(config.uri(), "neo4j+s://db.example.com:7999");
    }

    #[test]
    fn scheme_round_trip() {
        for scheme in SCHEMES {
            assert_eq!(scheme.as_str().parse::<Scheme>(), Ok(scheme));
        }
        assert!("http".parse::<Scheme>().is_err());
    }
}
