//! Gateway configuration
//!
//! Every option is a command-line flag with an environment variable
//! fallback, so the gateway can be configured either way.

use crate::error::ConfigError;
use crate::logging::LogFormat;
use crate::server::Listener;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use wasm_gateway_runtime::LoadPolicy;

/// Gateway settings
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wasm-gateway",
    version,
    about = "Serve sandboxed WASM plugins as MCP-style tools over HTTP"
)]
pub struct GatewayConfig {
    /// Address to bind
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Serve HTTPS instead of plain HTTP
    #[arg(
        long,
        env = "USE_HTTPS",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub use_https: bool,

    /// PEM certificate chain, required with HTTPS
    #[arg(long, env = "CERT_FILE")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key, required with HTTPS
    #[arg(long, env = "KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Bearer token expected from clients; empty disables authentication
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Enforce the bearer token
    #[arg(
        long,
        env = "REQUIRE_AUTH",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub require_auth: bool,

    /// Tool catalog served on `/tools/list`
    #[arg(long, env = "TOOLS_FILE", default_value = "tools/mcp.list.json")]
    pub tools_file: PathBuf,

    /// Directory holding `<name>/plugin.wasm` artifacts
    #[arg(long, env = "FUNCTIONS_DIR", default_value = "functions")]
    pub functions_dir: PathBuf,

    /// Plugin load policy: `cached` or `per-call`
    #[arg(long, env = "PLUGIN_POLICY", default_value = "cached")]
    pub plugin_policy: LoadPolicy,

    /// Export invoked on every call
    #[arg(long, env = "ENTRY_POINT", default_value = "handle")]
    pub entry_point: String,

    /// Per-call deadline in seconds
    #[arg(long, env = "CALL_TIMEOUT_SECS", default_value_t = 30)]
    pub call_timeout_secs: u64,

    /// Linear memory limit per call, in MiB
    #[arg(long, env = "MAX_MEMORY_MB", default_value_t = 64)]
    pub max_memory_mb: usize,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log level used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl GatewayConfig {
    /// Reject inconsistent settings before anything is started
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_https {
            if self.cert_file.is_none() {
                return Err(ConfigError::MissingTlsFile("CERT_FILE"));
            }
            if self.key_file.is_none() {
                return Err(ConfigError::MissingTlsFile("KEY_FILE"));
            }
        }
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                option: "CALL_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_memory_mb == 0 {
            return Err(ConfigError::InvalidValue {
                option: "MAX_MEMORY_MB",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.entry_point.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                option: "ENTRY_POINT",
                reason: "must not be empty".to_string(),
            });
        }
        self.socket_addr().map(|_| ())
    }

    /// Token to enforce, if authentication is active
    ///
    /// Active only when `REQUIRE_AUTH` is set and a non-empty token is
    /// configured.
    pub fn auth_token(&self) -> Option<String> {
        if !self.require_auth {
            return None;
        }
        self.auth_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    /// Resolved listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or(ConfigError::InvalidAddress(raw))
    }

    /// Plain or TLS listener, depending on `USE_HTTPS`
    pub fn listener(&self) -> Listener {
        match (self.use_https, &self.cert_file, &self.key_file) {
            (true, Some(cert), Some(key)) => Listener::Tls {
                cert: cert.clone(),
                key: key.clone(),
            },
            _ => Listener::Plain,
        }
    }

    /// Per-call deadline
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Per-call memory limit in bytes
    pub fn max_memory_bytes(&self) -> usize {
        self.max_memory_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GatewayConfig {
        let mut argv = vec!["wasm-gateway"];
        argv.extend_from_slice(args);
        GatewayConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.port, 8080);
        assert!(!config.use_https);
        assert!(!config.require_auth);
        assert_eq!(config.tools_file, PathBuf::from("tools/mcp.list.json"));
        assert_eq!(config.functions_dir, PathBuf::from("functions"));
        assert_eq!(config.plugin_policy, LoadPolicy::Cached);
        assert_eq!(config.entry_point, "handle");
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_memory_bytes(), 64 * 1024 * 1024);
        assert!(config.validate().is_ok());
        assert!(matches!(config.listener(), Listener::Plain));
    }

    #[test]
    fn test_boolean_spellings() {
        assert!(parse(&["--use-https", "yes"]).use_https);
        assert!(parse(&["--use-https", "1"]).use_https);
        assert!(parse(&["--use-https"]).use_https);
        assert!(!parse(&["--require-auth", "no"]).require_auth);
        assert!(!parse(&["--require-auth", "0"]).require_auth);
        assert!(parse(&["--require-auth", "true"]).require_auth);
    }

    #[test]
    fn test_https_requires_certificate_and_key() {
        let config = parse(&["--use-https", "true"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTlsFile("CERT_FILE"))
        ));

        let config = parse(&["--use-https", "true", "--cert-file", "cert.pem"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTlsFile("KEY_FILE"))
        ));

        let config = parse(&[
            "--use-https",
            "true",
            "--cert-file",
            "cert.pem",
            "--key-file",
            "key.pem",
        ]);
        assert!(config.validate().is_ok());
        assert!(matches!(config.listener(), Listener::Tls { .. }));
    }

    #[test]
    fn test_auth_token_activation() {
        assert_eq!(parse(&["--auth-token", "secret"]).auth_token(), None);
        assert_eq!(parse(&["--require-auth", "true"]).auth_token(), None);
        assert_eq!(
            parse(&["--require-auth", "true", "--auth-token", ""]).auth_token(),
            None
        );
        assert_eq!(
            parse(&["--require-auth", "true", "--auth-token", "secret"]).auth_token(),
            Some("secret".to_string())
        );
    }

    #[test]
    fn test_policy_and_limits() {
        let config = parse(&["--plugin-policy", "per-call", "--max-memory-mb", "8"]);
        assert_eq!(config.plugin_policy, LoadPolicy::PerCall);
        assert_eq!(config.max_memory_bytes(), 8 * 1024 * 1024);

        assert!(GatewayConfig::try_parse_from(["wasm-gateway", "--plugin-policy", "never"]).is_err());
        assert!(parse(&["--call-timeout-secs", "0"]).validate().is_err());
        assert!(parse(&["--entry-point", " "]).validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = parse(&["--host", "127.0.0.1", "--port", "9090"]);
        assert_eq!(config.socket_addr().unwrap().port(), 9090);

        let config = parse(&["--host", "not a host"]);
        assert!(matches!(
            config.socket_addr(),
            Err(ConfigError::InvalidAddress(_))
        ));
    }
}
