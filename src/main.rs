use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use type_context::mcp_server::ContextMcpServer;
use type_context::{ContextClient, ExtractRequest};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "type-context", version, long_version = LONG_VERSION)]
#[command(about = "Extract the minimal type context of a function")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the type context of one function
    Extract {
        /// Workspace root directory
        #[arg(long, default_value = ".")]
        workspace: String,
        /// Source file declaring the function, relative to the workspace
        #[arg(long)]
        file: String,
        /// Function signature as written in the source
        #[arg(long)]
        signature: String,
        /// Source language, detected from the file extension by default
        #[arg(long)]
        language: Option<String>,
        /// List impl members one by one instead of merging impl blocks
        #[arg(long)]
        no_merge: bool,
        /// Prefix type cards with their project-relative path
        #[arg(long)]
        include_path: bool,
        /// Keep trait impls of dependent types
        #[arg(long)]
        include_trait_impls: bool,
        /// Descend into standard-library and external types
        #[arg(long)]
        keep_std: bool,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the MCP protocol over stdio
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the context or MCP traffic
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => ContextMcpServer::serve_stdio().await?,
        Command::Extract {
            workspace,
            file,
            signature,
            language,
            no_merge,
            include_path,
            include_trait_impls,
            keep_std,
            json,
        } => {
            let client = ContextClient::new()?;
            let mut request = ExtractRequest::new(workspace, file, signature);
            request.language = language;
            // flags only override configuration when given
            request.merge_impls = no_merge.then_some(false);
            request.include_path = include_path.then_some(true);
            request.include_trait_impls = include_trait_impls.then_some(true);
            request.ignore_std = keep_std.then_some(false);

            let response = client.extract(request).await?;
            if json {
                let out = serde_json::to_string_pretty(&response)
                    .context("Failed to serialize response")?;
                println!("{}", out);
            } else {
                println!("{}", response.context);
            }
            tracing::debug!(
                "{} types, {} entries in {} ms",
                response.types_visited,
                response.entries,
                response.duration_ms
            );
        }
    }

    Ok(())
}
