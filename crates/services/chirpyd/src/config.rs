//! Process configuration, read once at startup.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use chirpy_models::db::config::DbConfig;

use crate::prelude::*;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Deployment flavour. Only `dev` exposes the reset endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    Dev,
    #[default]
    Prod,
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "dev" {
            Platform::Dev
        } else {
            Platform::Prod
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Dev => f.write_str("dev"),
            Platform::Prod => f.write_str("prod"),
        }
    }
}

pub struct Config {
    pub db: DbConfig,
    pub jwt_secret: String,
    pub polka_key: String,
    pub platform: Platform,
    pub bind_address: SocketAddr,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db", &self.db.to_string())
            .field("jwt_secret", &"REDACTED")
            .field("polka_key", &"REDACTED")
            .field("platform", &self.platform)
            .field("bind_address", &self.bind_address)
            .finish()
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Environment
    ///
    /// * `DATABASE_URL` - PostgreSQL connection string (required)
    /// * `JWT_SECRET` - access token signing secret (required)
    /// * `POLKA_KEY` - billing webhook API key (required)
    /// * `PLATFORM` - `dev` or `prod` (default `prod`)
    /// * `BIND_ADDRESS` - listen address (default `127.0.0.1:8080`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(Error::MissingEnv(name))
        };

        let db = DbConfig::new(required("DATABASE_URL")?);
        let jwt_secret = required("JWT_SECRET")?;
        let polka_key = required("POLKA_KEY")?;
        let platform = lookup("PLATFORM")
            .map(|value| Platform::from_str(&value).unwrap_or_default())
            .unwrap_or_default();
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| String::from(DEFAULT_BIND_ADDRESS))
            .parse()
            .map_err(|_| Error::InvalidEnv("BIND_ADDRESS"))?;

        Ok(Self {
            db,
            jwt_secret,
            polka_key,
            platform,
            bind_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name: &str| vars.get(name).map(|v| v.to_string())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://chirpy:pw@localhost/chirpy"),
        ("JWT_SECRET", "jwt"),
        ("POLKA_KEY", "polka"),
    ];

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.platform, Platform::Prod);
        assert_eq!(config.bind_address.to_string(), DEFAULT_BIND_ADDRESS);
        assert_eq!(config.jwt_secret, "jwt");
        assert_eq!(config.polka_key, "polka");
    }

    #[test]
    fn dev_platform() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PLATFORM", "dev"));
        vars.push(("BIND_ADDRESS", "0.0.0.0:9000"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.platform, Platform::Dev);
        assert_eq!(config.bind_address.port(), 9000);
    }

    #[test]
    fn missing_or_blank_secret() {
        let vars = [REQUIRED[0], REQUIRED[2]];
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(Error::MissingEnv("JWT_SECRET"))
        ));

        let vars = [REQUIRED[0], ("JWT_SECRET", "  "), REQUIRED[2]];
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(Error::MissingEnv("JWT_SECRET"))
        ));
    }

    #[test]
    fn invalid_bind_address() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("BIND_ADDRESS", "not-an-address"));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(Error::InvalidEnv("BIND_ADDRESS"))
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("pw@"));
        assert!(!printed.contains("\"jwt\""));
        assert!(!printed.contains("\"polka\""));
    }
}
