//! Workboard MCP server entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use workboard_mcp::config::{resolve_config_path, resolve_data_path, ServerConfig};
use workboard_mcp::protocol::negotiation;
use workboard_mcp::registry::CapabilityKind;
use workboard_mcp::transport::StdioTransport;
use workboard_mcp::types::{Implementation, ServerCapabilities, MCP_VERSION};
use workboard_mcp::{build_server, McpServer, ProtocolHandler, SharedWorkspace, WorkspaceManager};

#[derive(Parser)]
#[command(
    name = "workboard-mcp",
    about = "MCP server for Workboard: project boards, items and notes for LLM clients",
    version
)]
struct Cli {
    /// Path to the server config (JSON).
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the board snapshot file.
    #[arg(short, long, global = true)]
    data: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP.
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port).
        #[arg(long, default_value = "127.0.0.1:3100")]
        addr: String,

        /// Bearer token for authentication.
        /// Also reads from WORKBOARD_TOKEN env var.
        #[arg(long)]
        token: Option<String>,
    },

    /// Load the board snapshot and config and report counts.
    Validate,

    /// Print server info and capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   workboard-mcp completions bash > ~/.local/share/bash-completion/completions/workboard-mcp
    ///   workboard-mcp completions zsh > ~/.zfunc/_workboard-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

fn open(cli: &Cli) -> anyhow::Result<(Arc<McpServer>, SharedWorkspace)> {
    let config = ServerConfig::resolve(cli.config.as_deref())?;
    let data_path = resolve_data_path(cli.data.as_deref());
    tracing::info!("Board snapshot: {data_path}");
    let workspace = WorkspaceManager::open(&data_path)?.into_shared();
    let server = build_server(config, &workspace)?;
    Ok((Arc::new(server), workspace))
}

async fn save(workspace: &SharedWorkspace) {
    if let Err(e) = workspace.lock().await.save() {
        tracing::error!("Failed to save board snapshot: {e}");
    }
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

    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Serve => {
            let (server, workspace) = open(&cli)?;
            let handler = Arc::new(ProtocolHandler::new(server));
            StdioTransport::new(handler).run().await?;
            save(&workspace).await;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp { addr, token } => {
            use workboard_mcp::transport::SseTransport;

            // Resolve token: CLI flag > env var
            let effective_token = token
                .clone()
                .or_else(|| std::env::var("WORKBOARD_TOKEN").ok());
            if effective_token.is_some() {
                tracing::info!("Auth: bearer token required");
            }

            let (server, workspace) = open(&cli)?;
            let transport = SseTransport::new(server, effective_token);
            let result = transport.run(addr).await;
            save(&workspace).await;
            result?;
        }

        Commands::Validate => {
            let config_path = resolve_config_path(cli.config.as_deref());
            let data_path = resolve_data_path(cli.data.as_deref());
            if !std::path::Path::new(&data_path).exists() {
                eprintln!("Board snapshot not found: {data_path}");
                std::process::exit(1);
            }
            match open(&cli) {
                Ok((server, workspace)) => {
                    let manager = workspace.lock().await;
                    let ws = manager.workspace();
                    let registry = server.registry();
                    println!("Valid board snapshot: {data_path}");
                    match config_path {
                        Some(p) => println!("  Config:    {}", p.display()),
                        None => println!("  Config:    defaults"),
                    }
                    println!("  Boards:    {}", ws.boards().len());
                    println!("  Items:     {}", ws.items.len());
                    println!("  Users:     {}", ws.users.len());
                    println!("  Notes:     {}", ws.notes().len());
                    println!(
                        "  Exposing {} resources, {} tools, {} prompts",
                        registry.count(CapabilityKind::Resource),
                        registry.count(CapabilityKind::Tool),
                        registry.count(CapabilityKind::Prompt)
                    );
                }
                Err(e) => {
                    eprintln!("Invalid setup: {e:#}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let workspace =
                WorkspaceManager::in_memory(workboard::Workspace::sample()).into_shared();
            let config = ServerConfig::resolve(cli.config.as_deref())?;
            let server = build_server(config, &workspace)?;
            let registry = server.registry();
            let negotiated = negotiation::negotiate(registry);
            let ids = |kind| registry.list(kind).map(|d| d.id.as_str()).collect::<Vec<_>>();
            let info = serde_json::json!({
                "server": Implementation::server(),
                "protocol_version": MCP_VERSION,
                "capabilities": ServerCapabilities::for_kinds(&negotiated),
                "rate_limit": server.config().rate_limit,
                "resources": ids(CapabilityKind::Resource),
                "tools": ids(CapabilityKind::Tool),
                "prompts": ids(CapabilityKind::Prompt),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "workboard-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            let (server, workspace) = open(&cli)?;
            let runtime = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || workboard_mcp::repl::run(server, runtime)).await??;
            save(&workspace).await;
        }
    }

    Ok(())
}
