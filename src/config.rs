//! Environment-driven settings for the three binaries.

use std::{fmt, net::SocketAddr, time::Duration};

use anyhow::{bail, Context, Result};

pub const DEFAULT_CONTENT_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_GATEWAY_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_USER_SERVICE_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_GATEWAY_ROUTES: &str = "/users=http://user-service:8080";
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;

fn from_process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Database settings that are part of every process's startup contract.
/// Storage is in-memory, so nothing connects with them.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl DatabaseConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("POSTGRES_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("POSTGRES_PORT must be a port number, got {raw:?}"))?,
            None => 5432,
        };
        Ok(DatabaseConfig {
            host: lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".to_owned()),
            port,
            user: lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_owned()),
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
            dbname: lookup("POSTGRES_DBNAME").unwrap_or_else(|| "conduit".to_owned()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env(default_address: &str) -> Result<Self> {
        Self::from_lookup(default_address, from_process_env)
    }

    pub fn from_lookup(
        default_address: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw = lookup("BIND_ADDRESS").unwrap_or_else(|| default_address.to_owned());
        let bind_address = raw
            .parse()
            .with_context(|| format!("BIND_ADDRESS must be host:port, got {raw:?}"))?;
        Ok(Config {
            bind_address,
            database: DatabaseConfig::from_lookup(&lookup)?,
        })
    }
}

/// The signing secret shared by every token the content service issues.
pub fn jwt_secret() -> Result<String> {
    std::env::var("JWT_SECRET").context("JWT_SECRET must be set")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub prefix: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub routes: Vec<ProxyRoute>,
    pub forward_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(from_process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let routes = lookup("GATEWAY_ROUTES").unwrap_or_else(|| DEFAULT_GATEWAY_ROUTES.to_owned());
        let timeout = match lookup("PROXY_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PROXY_TIMEOUT_SECS must be whole seconds, got {raw:?}"))?,
            None => DEFAULT_PROXY_TIMEOUT_SECS,
        };
        if timeout == 0 {
            bail!("PROXY_TIMEOUT_SECS must be greater than zero");
        }
        Ok(GatewayConfig {
            routes: parse_routes(&routes)?,
            forward_timeout: Duration::from_secs(timeout),
        })
    }
}

/// Parses `prefix=target,prefix=target`. Each prefix must map to exactly
/// one downstream, so a prefix may not sit under another one.
pub fn parse_routes(raw: &str) -> Result<Vec<ProxyRoute>> {
    let mut routes: Vec<ProxyRoute> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((prefix, target)) = entry.split_once('=') else {
            bail!("Gateway route {entry:?} is not prefix=target");
        };
        let (prefix, target) = (prefix.trim(), target.trim());
        if !prefix.starts_with('/') || prefix.ends_with('/') || prefix.contains('*') {
            bail!("Gateway prefix {prefix:?} must start with '/' and not end with '/'");
        }
        if prefix == "/ping" {
            bail!("Gateway prefix {prefix:?} is reserved");
        }
        if target.is_empty() {
            bail!("Gateway prefix {prefix:?} has no target");
        }
        if let Some(clash) = routes
            .iter()
            .find(|r| nests_under(&r.prefix, prefix) || nests_under(prefix, &r.prefix))
        {
            let existing = &clash.prefix;
            bail!("Gateway prefixes {existing:?} and {prefix:?} overlap");
        }
        routes.push(ProxyRoute {
            prefix: prefix.to_owned(),
            target: target.to_owned(),
        });
    }
    if routes.is_empty() {
        bail!("At least one gateway route is required");
    }
    Ok(routes)
}

fn nests_under(inner: &str, outer: &str) -> bool {
    inner == outer
        || inner
            .strip_prefix(outer)
            .map_or(false, |rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(DEFAULT_CONTENT_ADDRESS, lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.dbname, "conduit");

        let gateway = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            gateway.routes,
            vec![ProxyRoute {
                prefix: "/users".into(),
                target: "http://user-service:8080".into(),
            }]
        );
        assert_eq!(gateway.forward_timeout, Duration::from_secs(30));
    }

    #[test]
    fn database_settings_are_read() {
        let config = Config::from_lookup(
            DEFAULT_CONTENT_ADDRESS,
            lookup(&[
                ("BIND_ADDRESS", "127.0.0.1:9000"),
                ("POSTGRES_HOST", "db"),
                ("POSTGRES_PORT", "6543"),
                ("POSTGRES_PASSWORD", "hunter2"),
            ]),
        )
        .unwrap();
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert!(!format!("{:?}", config.database).contains("hunter2"));
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(Config::from_lookup(
            DEFAULT_CONTENT_ADDRESS,
            lookup(&[("POSTGRES_PORT", "lots")])
        )
        .is_err());
    }

    #[test]
    fn several_routes() {
        let routes =
            parse_routes("/users=http://user-service:8080, /billing=http://billing:9000").unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].prefix, "/billing");
        assert_eq!(routes[1].target, "http://billing:9000");
    }

    #[test]
    fn overlapping_routes_are_refused() {
        assert!(parse_routes("/users=http://a,/users/admin=http://b").is_err());
        assert!(parse_routes("/users=http://a,/users=http://b").is_err());
        assert!(parse_routes("/users=http://a,/usersx=http://b").is_ok());
    }

    #[test]
    fn malformed_routes_are_refused() {
        assert!(parse_routes("").is_err());
        assert!(parse_routes("/users").is_err());
        assert!(parse_routes("users=http://a").is_err());
        assert!(parse_routes("/users/=http://a").is_err());
        assert!(parse_routes("/=http://a").is_err());
        assert!(parse_routes("/ping=http://a").is_err());
    }
}
