use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyboard_mcp::{api, config, mcp};

#[derive(Parser)]
#[command(name = "storyboard-mcp")]
#[command(about = "MCP server for tracking project stories from an AI agent")]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct BackendArgs {
    /// Backend API base URL
    #[arg(long, global = true, env = config::API_URL_ENV, default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Bearer token for the backend API
    #[arg(long, global = true, env = config::API_TOKEN_ENV, hide_env_values = true)]
    api_token: Option<String>,

    /// Project used when a tool call does not name one
    #[arg(long, global = true, env = config::PROJECT_ID_ENV)]
    project_id: Option<i64>,
}

impl BackendArgs {
    fn into_config(self) -> anyhow::Result<config::Config> {
        config::Config::new(
            self.api_url,
            self.api_token.unwrap_or_default(),
            self.project_id,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server via stdio (default)
    Mcp,
    /// Serve MCP over streamable HTTP
    Serve {
        /// Port for the HTTP endpoint
        #[arg(short, long, default_value = "3100")]
        port: u16,
    },
    /// Check that the backend is reachable
    Health,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "storyboard_mcp=info".into()),
    );

    if use_stderr {
        // MCP mode: log to stderr so stdout is clean for protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, None | Some(Commands::Mcp));
    init_tracing(use_stderr);

    let config = cli.backend.into_config()?;

    match cli.command {
        None | Some(Commands::Mcp) => {
            mcp::run_stdio_server(config).await?;
        }
        Some(Commands::Serve { port }) => {
            api::serve(config, api::AuthConfig::from_env(), port).await?;
        }
        Some(Commands::Health) => {
            let client = mcp::BackendClient::from_config(&config);
            if client.health_check().await {
                println!("healthy ({})", client.base_url());
            } else {
                println!("unhealthy ({})", client.base_url());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
