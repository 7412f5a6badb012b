use anyhow::Result;
use clap::{Parser, Subcommand};
use python_ast_rag::{CodeChunk, CodeRagClient, Config, SearchOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "python-ast-rag", version, long_version = LONG_VERSION)]
#[command(about = "Index Python code by class and function and search the chunks")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "PY_AST_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend, overriding the configuration
    #[arg(long, global = true, value_parser = ["lancedb", "memory"])]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every Python file below a directory
    Index {
        /// Directory to index
        path: PathBuf,
    },
    /// Search the indexed chunks
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract chunks from one file without storing them
    Extract {
        /// Python source file
        file: PathBuf,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract { file, json } => {
            let (chunks, diagnostics) = CodeRagClient::extract_file(&file)?;
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                print_chunks(&chunks);
            }
        }
        Command::Index { path } => {
            let client = build_client(cli.config, cli.backend).await?;
            let report = client.index_directory(&path).await?;
            println!(
                "Indexed {} chunks from {} files in {} ms",
                report.chunks_indexed, report.files_scanned, report.duration_ms
            );
            for diagnostic in &report.diagnostics {
                println!("  {}", diagnostic);
            }
        }
        Command::Search { query, limit, json } => {
            let client = build_client(cli.config, cli.backend).await?;
            let limit = limit.unwrap_or(client.config().search.limit);
            let outcome = client.search(&query, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.chunks)?);
            } else {
                print_outcome(&outcome);
            }
        }
    }

    Ok(())
}

async fn build_client(config_path: Option<PathBuf>, backend: Option<String>) -> Result<CodeRagClient> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(backend) = backend {
        config.vector_db.backend = backend;
    }
    CodeRagClient::with_config(config).await
}

fn print_chunks(chunks: &[CodeChunk]) {
    for chunk in chunks {
        let meta = &chunk.metadata;
        println!(
            "{} {} [{}-{}]{}",
            meta.kind,
            meta.name,
            meta.line_range.start,
            meta.line_range.end,
            meta.parent_name
                .as_deref()
                .map(|p| format!(" in {}", p))
                .unwrap_or_default()
        );
        if !meta.dependencies.is_empty() {
            let deps: Vec<_> = meta.dependencies.iter().map(String::as_str).collect();
            println!("    calls: {}", deps.join(", "));
        }
    }
}

fn print_outcome(outcome: &SearchOutcome) {
    for (rank, chunk) in outcome.chunks.iter().enumerate() {
        println!("{}. {}", rank + 1, chunk.metadata.chunk_id());
        print_chunks(std::slice::from_ref(chunk));
        println!("{}\n", chunk.content);
    }
    for failure in &outcome.failures {
        println!(
            "!  result #{} ({}): {}",
            failure.rank + 1,
            failure.source_id.as_deref().unwrap_or("unknown source"),
            failure.error
        );
    }
}
