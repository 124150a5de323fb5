//! Service configuration

use anyhow::Result;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Where login sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

/// HTTP-facing configuration
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: IpAddr,
    pub port: u16,
    pub session_backend: SessionBackend,
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure`; enable behind HTTPS
    pub cookie_secure: bool,
}

impl WebConfig {
    /// Create a new WebConfig from environment variables
    ///
    /// # Environment Variables
    /// - `HOST`: Listen address (default: 0.0.0.0)
    /// - `PORT`: Listen port (default: 3001)
    /// - `SESSION_BACKEND`: `memory` or `redis` (default: memory)
    /// - `SESSION_TTL_SECS`: Session lifetime in seconds (default: 86400)
    /// - `COOKIE_SECURE`: `true` to set the Secure cookie flag (default: false)
    pub fn from_env() -> Result<Self> {
        let host = match std::env::var("HOST") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("HOST is not a valid IP address: {}", raw))?,
            Err(_) => IpAddr::from([0, 0, 0, 0]),
        };

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3001);

        let session_backend = match std::env::var("SESSION_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            "redis" => SessionBackend::Redis,
            other => anyhow::bail!("Unknown SESSION_BACKEND: {}", other),
        };

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86_400);

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(WebConfig {
            host,
            port,
            session_backend,
            session_ttl: Duration::from_secs(session_ttl_secs),
            cookie_secure,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "HOST",
        "PORT",
        "SESSION_BACKEND",
        "SESSION_TTL_SECS",
        "COOKIE_SECURE",
    ];

    fn clear() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = WebConfig::from_env().unwrap();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3001");
        assert_eq!(config.session_backend, SessionBackend::Memory);
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert!(!config.cookie_secure);
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear();
        unsafe {
            std::env::set_var("HOST", "127.0.0.1");
            std::env::set_var("PORT", "8080");
            std::env::set_var("SESSION_BACKEND", "Redis");
            std::env::set_var("SESSION_TTL_SECS", "60");
            std::env::set_var("COOKIE_SECURE", "true");
        }

        let config = WebConfig::from_env().unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.session_backend, SessionBackend::Redis);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert!(config.cookie_secure);
        clear();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_rejected() {
        clear();
        unsafe {
            std::env::set_var("SESSION_BACKEND", "memcached");
        }
        assert!(WebConfig::from_env().is_err());
        clear();
    }
}
