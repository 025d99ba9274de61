//! Gateway configuration
//!
//! Command-line arguments and environment variables (merged by clap) take
//! priority over `config.toml`, which takes priority over compiled defaults.

use clap::Parser;
use devrpg_common::config::{resolve_setting, resolve_string, TomlConfig};
use devrpg_common::ServiceKind;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3210";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://devrpg.db?mode=rwc";
pub const DEFAULT_WORKFLOW_URL: &str = "http://n8n:5678";
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 120;

/// Command-line arguments for devrpg-gateway
#[derive(Parser, Debug, Default)]
#[command(name = "devrpg-gateway")]
#[command(about = "Dev-RPG analysis gateway")]
#[command(version)]
pub struct Args {
    /// Path to config.toml
    #[arg(short, long, env = "DEVRPG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "DEVRPG_BIND")]
    pub bind: Option<String>,

    /// sqlx database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Minimum pooled database connections
    #[arg(long, env = "DB_MIN_CONNECTIONS")]
    pub db_min_connections: Option<u32>,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: Option<u32>,

    /// Seconds to wait for a pooled connection before failing
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS")]
    pub db_acquire_timeout_secs: Option<u64>,

    #[arg(long, env = "LIGHTHOUSE_MCP_URL")]
    pub lighthouse_mcp_url: Option<String>,

    #[arg(long, env = "CODE_QUALITY_MCP_URL")]
    pub code_quality_mcp_url: Option<String>,

    #[arg(long, env = "ARCHITECT_MCP_URL")]
    pub architect_mcp_url: Option<String>,

    #[arg(long, env = "EVENT_LOOP_MCP_URL")]
    pub event_loop_mcp_url: Option<String>,

    #[arg(long, env = "COST_MCP_URL")]
    pub cost_mcp_url: Option<String>,

    /// Workflow engine base URL for CI webhook forwarding
    #[arg(long, env = "N8N_WEBHOOK_URL")]
    pub workflow_url: Option<String>,

    /// LLM host probed by /health
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Per-backend timeout for the analysis fan-out, seconds
    #[arg(long, env = "ANALYSIS_TIMEOUT_SECS")]
    pub analysis_timeout_secs: Option<u64>,
}

/// Database pool bounds
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_connections: 5,
            max_connections: 20,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    pub database_url: String,
    pub pool: PoolSettings,
    /// Base URL of every analysis backend
    pub services: BTreeMap<ServiceKind, String>,
    pub workflow_url: String,
    pub ollama_url: String,
    /// Per-backend timeout for the analysis fan-out
    pub analysis_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            pool: PoolSettings::default(),
            services: ServiceKind::ALL
                .into_iter()
                .map(|service| (service, default_service_url(service)))
                .collect(),
            workflow_url: DEFAULT_WORKFLOW_URL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    /// Merge CLI/env arguments with the TOML file and compiled defaults
    pub fn resolve(args: Args, toml: &TomlConfig) -> Self {
        let defaults = PoolSettings::default();
        let pool = PoolSettings {
            min_connections: resolve_setting(
                args.db_min_connections,
                toml.pool.min_connections,
                defaults.min_connections,
            ),
            max_connections: resolve_setting(
                args.db_max_connections,
                toml.pool.max_connections,
                defaults.max_connections,
            ),
            acquire_timeout: Duration::from_secs(resolve_setting(
                args.db_acquire_timeout_secs,
                toml.pool.acquire_timeout_secs,
                defaults.acquire_timeout.as_secs(),
            )),
        };

        let toml_services = &toml.services;
        let services = [
            (ServiceKind::Lighthouse, args.lighthouse_mcp_url, &toml_services.lighthouse),
            (ServiceKind::CodeQuality, args.code_quality_mcp_url, &toml_services.code_quality),
            (ServiceKind::Architect, args.architect_mcp_url, &toml_services.architect),
            (ServiceKind::EventLoop, args.event_loop_mcp_url, &toml_services.event_loop),
            (ServiceKind::Cost, args.cost_mcp_url, &toml_services.cost),
        ]
        .into_iter()
        .map(|(service, cli, file)| {
            let url = resolve_string(cli, file.as_ref(), &default_service_url(service));
            (service, trim_base_url(url))
        })
        .collect();

        let timeout_secs = resolve_setting(
            args.analysis_timeout_secs,
            toml.analysis_timeout_secs,
            DEFAULT_ANALYSIS_TIMEOUT_SECS,
        );

        Self {
            bind: resolve_string(args.bind, toml.bind.as_ref(), DEFAULT_BIND),
            database_url: resolve_string(
                args.database_url,
                toml.database_url.as_ref(),
                DEFAULT_DATABASE_URL,
            ),
            pool,
            services,
            workflow_url: trim_base_url(resolve_string(
                args.workflow_url,
                toml.workflow_url.as_ref(),
                DEFAULT_WORKFLOW_URL,
            )),
            ollama_url: trim_base_url(resolve_string(
                args.ollama_url,
                toml.llm.ollama_url.as_ref(),
                DEFAULT_OLLAMA_URL,
            )),
            analysis_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Container-network default for a backend, e.g. `http://code_quality_mcp:8000`
pub fn default_service_url(service: ServiceKind) -> String {
    format!("http://{}:8000", service.service_name())
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
