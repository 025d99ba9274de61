//! Backend configuration
//!
//! One binary serves every backend; `--kind` picks which. LLM settings
//! resolve CLI/env, then the `[llm]` table of `config.toml`, then defaults.

use clap::Parser;
use devrpg_common::config::{resolve_string, TomlConfig};
use devrpg_common::ServiceKind;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_PROVIDER: &str = "groq";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_LIGHTHOUSE_BIN: &str = "lighthouse";

/// Command-line arguments for devrpg-mcp
#[derive(Parser, Debug)]
#[command(name = "devrpg-mcp")]
#[command(about = "Dev-RPG analysis backend")]
#[command(version)]
pub struct Args {
    /// Backend to serve: code_quality, architect, event_loop, cost or lighthouse
    #[arg(short, long, env = "MCP_KIND")]
    pub kind: ServiceKind,

    /// Path to config.toml
    #[arg(short, long, env = "DEVRPG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "MCP_BIND")]
    pub bind: Option<String>,

    /// `groq` or `ollama`
    #[arg(long, env = "LLM_PROVIDER")]
    pub llm_provider: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// OpenAI-compatible API base, without `/chat/completions`
    #[arg(long, env = "GROQ_API_URL")]
    pub groq_api_url: Option<String>,

    #[arg(long, env = "GROQ_MODEL")]
    pub groq_model: Option<String>,

    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    #[arg(long, env = "OLLAMA_MODEL")]
    pub ollama_model: Option<String>,

    /// Lighthouse CLI executable
    #[arg(long, env = "LIGHTHOUSE_BIN")]
    pub lighthouse_bin: Option<String>,
}

/// LLM provider settings before client selection
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: String,
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            groq_api_key: None,
            groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

/// Resolved backend configuration
#[derive(Debug, Clone)]
pub struct McpConfig {
    pub service: ServiceKind,
    pub bind: String,
    pub llm: LlmSettings,
    pub lighthouse_bin: String,
}

impl McpConfig {
    pub fn resolve(args: Args, toml: &TomlConfig) -> Self {
        let llm = &toml.llm;

        Self {
            service: args.kind,
            // The top-level `bind` key belongs to the gateway
            bind: args.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            llm: LlmSettings {
                provider: resolve_string(args.llm_provider, llm.provider.as_ref(), DEFAULT_PROVIDER)
                    .trim()
                    .to_ascii_lowercase(),
                groq_api_key: args.groq_api_key.filter(|key| !key.trim().is_empty()),
                groq_api_url: trim_base_url(resolve_string(
                    args.groq_api_url,
                    llm.groq_api_url.as_ref(),
                    DEFAULT_GROQ_API_URL,
                )),
                groq_model: resolve_string(args.groq_model, llm.groq_model.as_ref(), DEFAULT_GROQ_MODEL),
                ollama_url: trim_base_url(resolve_string(
                    args.ollama_url,
                    llm.ollama_url.as_ref(),
                    DEFAULT_OLLAMA_URL,
                )),
                ollama_model: resolve_string(
                    args.ollama_model,
                    llm.ollama_model.as_ref(),
                    DEFAULT_OLLAMA_MODEL,
                ),
            },
            lighthouse_bin: resolve_string(
                args.lighthouse_bin,
                llm.lighthouse_bin.as_ref(),
                DEFAULT_LIGHTHOUSE_BIN,
            ),
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
