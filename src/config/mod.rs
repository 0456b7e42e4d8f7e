// Configuration module entry point
// Layered configuration: defaults < config file < environment < CLI flags

mod state;
mod types;

use std::net::SocketAddr;

use clap::Parser;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig};

/// Command line arguments
///
/// Flags given here override the config file and environment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rangehttpd",
    about = "Static file server with HTTP byte-range support for media streaming",
    version
)]
pub struct CliArgs {
    /// Port to serve on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Configuration file path, without extension (TOML; optional)
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

impl Config {
    /// Load configuration, applying CLI overrides last.
    ///
    /// The config file is optional; absent sections fall back to the
    /// defaults set here.
    pub fn load(cli: &CliArgs) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&cli.config).required(false))
            .add_source(config::Environment::with_prefix("RANGEHTTPD"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.directory", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;

        if let Some(port) = cli.port {
            cfg.server.port = port;
        }
        if let Some(ref host) = cli.host {
            cfg.server.host.clone_from(host);
        }
        if let Some(ref directory) = cli.directory {
            cfg.server.directory.clone_from(directory);
        }

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> CliArgs {
        CliArgs {
            port: None,
            directory: None,
            host: None,
            // Point at a name that cannot exist so defaults apply
            config: "/nonexistent/rangehttpd-test-config".to_string(),
        }
    }

    #[test]
    fn defaults_match_the_documented_cli_surface() {
        let cfg = Config::load(&bare_args()).expect("load defaults");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.directory, ".");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.max_connections.is_none());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let mut args = bare_args();
        args.port = Some(9000);
        args.directory = Some("/tmp".to_string());
        args.host = Some("127.0.0.1".to_string());

        let cfg = Config::load(&args).expect("load with overrides");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.directory, "/tmp");
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
    }
}
