//! JIRA Query MCP Server - answer JIRA questions via MCP
//!
//! # Usage
//!
//! ```bash
//! jira-query-mcp-server [--log-level LEVEL] [stdio|test-connection|validate-knowledge-store]
//! ```
//!
//! Without a subcommand the server runs over stdio. Logs go to stderr.

use clap::{Parser, Subcommand};
use jira_query_mcp_server::config::ServerConfig;
use jira_query_mcp_server::jira_client::{IssueExecutor, JiraClient};
use jira_query_mcp_server::knowledge_store::{load_mappings, QueryMapping};
use jira_query_mcp_server::logging::init_logging;
use jira_query_mcp_server::JiraQueryMcpServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// MCP server answering JIRA questions through a JQL knowledge store
#[derive(Parser, Debug)]
#[command(name = "jira-query-mcp-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level
    #[arg(
        long,
        global = true,
        env = "MCP_LOG_LEVEL",
        default_value = "INFO",
        ignore_case = true,
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    log_level: String,

    /// The command to run (default: stdio)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Run the MCP server over stdio
    Stdio {
        /// Knowledge store file, overriding configuration
        #[arg(long)]
        knowledge_store: Option<PathBuf>,
    },

    /// Check JIRA connectivity and list a few projects
    TestConnection,

    /// Parse the knowledge store and list its mappings
    ValidateKnowledgeStore {
        /// Knowledge store file, overriding configuration
        #[arg(long)]
        knowledge_store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command.unwrap_or(Commands::Stdio {
        knowledge_store: None,
    }) {
        Commands::Stdio { knowledge_store } => run_stdio(knowledge_store).await,
        Commands::TestConnection => {
            test_connection().await;
            Ok(())
        }
        Commands::ValidateKnowledgeStore { knowledge_store } => {
            validate_knowledge_store(knowledge_store);
            Ok(())
        }
    }
}

async fn run_stdio(knowledge_store: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting JIRA Query MCP Server...");

    let mut config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => exit_with_guidance(&format!("{:#}", e)),
    };
    if let Some(path) = knowledge_store {
        config.server.knowledge_store_path = path;
    }

    let query_server = match JiraQueryMcpServer::new(config).await {
        Ok(server) => {
            info!(
                "JIRA Query MCP Server connected to {} with {} query mappings",
                server.config().jira.url,
                server.knowledge_store_size()
            );
            server
        }
        Err(e) => {
            error!(
                code = e.error_code(),
                data = %e.error_data(),
                "Failed to create JIRA Query MCP Server: {}",
                e
            );
            exit_with_guidance(&e.to_string())
        }
    };

    spawn_reload_on_hangup(query_server.clone());

    info!("Starting MCP server with STDIO transport...");
    let mut server = query_server.serve_stdio().await?;

    info!("🚀 JIRA Query MCP Server is running and ready to serve requests");
    server.run().await?;

    Ok(())
}

fn exit_with_guidance(message: &str) -> ! {
    eprintln!("❌ Failed to start JIRA Query MCP Server: {}", message);
    eprintln!("\nPlease check:");
    eprintln!("  - JIRA_URL and JIRA_TOKEN environment variables are set");
    eprintln!("  - JIRA_USERNAME is set if your instance needs basic auth");
    eprintln!("  - MCP_KNOWLEDGE_STORE_PATH points to a valid YAML document");
    eprintln!("  - JIRA instance is accessible");
    std::process::exit(1);
}

/// Reload the knowledge store whenever the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_hangup(server: JiraQueryMcpServer) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("SIGHUP reload disabled: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match server.reload_knowledge_store() {
                Ok(count) => info!("Knowledge store reloaded with {} query mappings", count),
                Err(e) => error!("Knowledge store reload failed, keeping previous mappings: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_server: JiraQueryMcpServer) {}

async fn test_connection() {
    println!("Testing JIRA connection...");

    let config = match ServerConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            println!("❌ Connection test failed: {:#}", e);
            std::process::exit(1);
        }
    };

    let client = match JiraClient::new(Arc::clone(&config)).await {
        Ok(client) => client,
        Err(e) => {
            println!("❌ Connection test failed: {}", e);
            std::process::exit(1);
        }
    };

    match client.list_projects().await {
        Ok(projects) => {
            println!("✅ Successfully connected to JIRA at {}", config.jira.url);
            println!("Found {} projects:", projects.len());
            for project in projects.iter().take(3) {
                println!("  - {}: {}", project.key, project.name);
            }
            if projects.len() > 3 {
                println!("  ... and {} more", projects.len() - 3);
            }
        }
        Err(e) => {
            println!("❌ Connection test failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn validate_knowledge_store(knowledge_store: Option<PathBuf>) {
    let path = match knowledge_store {
        Some(path) => path,
        None => match ServerConfig::load_server_settings() {
            Ok(settings) => settings.knowledge_store_path,
            Err(e) => {
                println!("❌ Error validating knowledge store: {:#}", e);
                std::process::exit(1);
            }
        },
    };

    println!("Validating knowledge store: {}", path.display());

    match load_mappings(&path) {
        Ok(mappings) if mappings.is_empty() => {
            println!("⚠️  Knowledge store is empty or file not found");
        }
        Ok(mappings) => {
            println!(
                "✅ Knowledge store loaded successfully with {} query mappings",
                mappings.len()
            );
            print_mappings(&mappings);
        }
        Err(e) => {
            println!("❌ Error validating knowledge store: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_mappings(mappings: &[QueryMapping]) {
    println!("\nQuery mappings:");
    for (index, mapping) in mappings.iter().enumerate() {
        println!("{}. {}", index + 1, mapping.description);
        println!("   Patterns: {}", mapping.question_patterns.join(", "));
        println!("   JQL: {}", mapping.jql_query);
    }
}
