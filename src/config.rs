//! Server configuration from the command line and environment.

use std::time::Duration;

use clap::Parser;
use tracing::warn;

use crate::components::RegistryConfig;
use crate::components::registry::{DEFAULT_REGISTRY_TTL, DEFAULT_SCOPE_MARKERS};

/// Environment override for the registry time-to-live, in milliseconds.
pub const REGISTRY_TTL_ENV: &str = "COMPONENT_LSP_REGISTRY_TTL_MS";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "component-language-server")]
#[command(about = "Language server for component tags and slots in markup documents")]
#[command(version)]
pub struct Args {
    /// Log level for stderr output (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Disable ANSI colors in stderr logs
    #[arg(long)]
    pub no_color: bool,

    /// Do not write a session log file
    #[arg(long)]
    pub no_log_file: bool,

    /// How long a resolved component registry is reused, in milliseconds
    #[arg(long, value_name = "MS")]
    pub registry_ttl_ms: Option<u64>,

    /// File name marking a component scope root (can be specified multiple times).
    /// Defaults to the Vite config file names.
    #[arg(long = "scope-marker", value_name = "FILE")]
    pub scope_markers: Vec<String>,

    /// Communicate over stdin/stdout (the only transport)
    #[arg(long)]
    pub stdio: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub registry: RegistryConfig,
}

impl ServerConfig {
    /// Builds the configuration, reading the TTL override from the process
    /// environment.
    pub fn from_args(args: &Args) -> Self {
        Self::from_args_and_env(args, std::env::var(REGISTRY_TTL_ENV).ok().as_deref())
    }

    /// CLI values win over `env_ttl`, which wins over the defaults.
    pub fn from_args_and_env(args: &Args, env_ttl: Option<&str>) -> Self {
        let env_ttl_ms = env_ttl.and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(e) => {
                warn!("Ignoring {}={:?}: {}", REGISTRY_TTL_ENV, raw, e);
                None
            }
        });
        let ttl = args
            .registry_ttl_ms
            .or(env_ttl_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REGISTRY_TTL);

        let scope_markers = if args.scope_markers.is_empty() {
            DEFAULT_SCOPE_MARKERS.iter().map(|m| m.to_string()).collect()
        } else {
            args.scope_markers.clone()
        };

        Self { registry: RegistryConfig { ttl, scope_markers } }
    }
}
