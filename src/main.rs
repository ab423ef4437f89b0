use clap::{Parser, Subcommand};
use kb_mcp::Result;
use kb_mcp::commands::{ingest_document, run_search, serve_mcp, show_config, show_status};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kb-mcp")]
#[command(about = "A document knowledge base with hybrid retrieval and an MCP server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Config {
        /// Write a default config file if none exists yet
        #[arg(long)]
        init: bool,
    },
    /// Ingest a document's extracted text into the knowledge base
    Ingest {
        /// Path to a file containing the extracted document text
        file: PathBuf,
    },
    /// Search the knowledge base from the command line
    Search {
        /// The search query
        query: String,
        /// Maximum number of results to return
        #[arg(long)]
        limit: Option<usize>,
        /// Similarity floor for the semantic pass
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Start MCP server on stdio
    Serve,
    /// Show connectivity status of the retrieval pipeline
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { init } => {
            show_config(init)?;
        }
        Commands::Ingest { file } => {
            ingest_document(&file).await?;
        }
        Commands::Search {
            query,
            limit,
            threshold,
        } => {
            run_search(&query, limit, threshold).await?;
        }
        Commands::Serve => {
            serve_mcp().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["kb-mcp", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn ingest_command_with_file() {
        let cli = Cli::try_parse_from(["kb-mcp", "ingest", "resume.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { file } = parsed.command {
                assert_eq!(file, PathBuf::from("resume.txt"));
            }
        }
    }

    #[test]
    fn search_command_with_query() {
        let cli = Cli::try_parse_from(["kb-mcp", "search", "list all candidates"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search {
                query,
                limit,
                threshold,
            } = parsed.command
            {
                assert_eq!(query, "list all candidates");
                assert_eq!(limit, None);
                assert_eq!(threshold, None);
            }
        }
    }

    #[test]
    fn search_command_with_limit_and_threshold() {
        let cli = Cli::try_parse_from([
            "kb-mcp",
            "search",
            "education details",
            "--limit",
            "3",
            "--threshold",
            "0.4",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search {
                query,
                limit,
                threshold,
            } = parsed.command
            {
                assert_eq!(query, "education details");
                assert_eq!(limit, Some(3));
                assert_eq!(threshold, Some(0.4));
            }
        }
    }

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["kb-mcp", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Serve);
        }
    }

    #[test]
    fn config_init_flag() {
        let cli = Cli::try_parse_from(["kb-mcp", "config", "--init"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { init } = parsed.command {
                assert!(init);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["kb-mcp", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["kb-mcp", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
