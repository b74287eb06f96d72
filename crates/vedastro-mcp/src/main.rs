//! VedAstro MCP Server — entry point.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use vedastro_mcp::config::{
    normalize_base_path, resolve_addr, resolve_api_base, ServerConfig, DEFAULT_BASE_PATH,
    DEFAULT_KEEP_ALIVE_SECS,
};
use vedastro_mcp::tools::ToolRegistry;
use vedastro_mcp::transport::HttpServer;
use vedastro_mcp::types::{InitializeResult, SERVER_NAME};

#[derive(Parser)]
#[command(
    name = "vedastro-mcp",
    about = "MCP server for VedAstro — Vedic astrology calculations over streamable HTTP and SSE",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (host:port). Falls back to VEDASTRO_MCP_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// VedAstro API base URL. Falls back to VEDASTRO_API_BASE.
        #[arg(long)]
        api_base: Option<String>,

        /// Prefix all routes are mounted under.
        #[arg(long, default_value = DEFAULT_BASE_PATH)]
        base_path: String,

        /// Answer /mcp with event-stream frames instead of a JSON body.
        #[arg(long)]
        sse_responses: bool,

        /// Seconds between keep-alive comments on session streams.
        #[arg(long, default_value_t = DEFAULT_KEEP_ALIVE_SECS)]
        keep_alive_secs: u64,

        /// Per-request timeout for VedAstro API calls, in seconds.
        #[arg(long, default_value_t = vedastro::DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
    },

    /// Print server capabilities and tools as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   vedastro-mcp completions bash > ~/.local/share/bash-completion/completions/vedastro-mcp
    ///   vedastro-mcp completions zsh > ~/.zfunc/_vedastro-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        api_base: None,
        base_path: DEFAULT_BASE_PATH.to_string(),
        sse_responses: false,
        keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        timeout_secs: vedastro::DEFAULT_TIMEOUT_SECS,
    }) {
        Commands::Serve {
            addr,
            api_base,
            base_path,
            sse_responses,
            keep_alive_secs,
            timeout_secs,
        } => {
            let config = ServerConfig {
                addr: resolve_addr(addr.as_deref()),
                api_base: resolve_api_base(api_base.as_deref()),
                base_path: normalize_base_path(&base_path),
                json_response: !sse_responses,
                keep_alive: Duration::from_secs(keep_alive_secs.max(1)),
                timeout: Duration::from_secs(timeout_secs.max(1)),
            };

            tracing::info!("{SERVER_NAME} MCP server");
            tracing::info!("VedAstro API: {}", config.api_base);

            HttpServer::new(config)?.run().await?;
        }

        Commands::Info => {
            let info = serde_json::json!({
                "server": InitializeResult::default_result(),
                "tools": ToolRegistry::list_tools(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vedastro-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
