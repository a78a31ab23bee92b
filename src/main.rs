//! Command-line entrypoint: index PDFs, purge the index, or run a one-off search.
//!
//! Every subcommand runs on a single-threaded runtime and awaits each remote call in turn.
//! Progress goes to stdout; diagnostics go to stderr through `tracing`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragindex::{
    config::{self, Config},
    embedding::build_embedding_client,
    logging,
    metrics::PipelineMetrics,
    processing::{
        IndexProgress, IndexSettings, Indexer, PdfPageReader, PurgeSettings, Retriever,
        SearchRequest, SearchSettings, discover_documents, purge_index,
    },
    vectors::{build_vector_store, parse_filter_arg},
};

#[derive(Parser)]
#[command(
    name = "ragindex",
    version,
    about = "Chunk, embed, and index PDF documents into a vector index"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index PDF files or directories (defaults to SOURCE_DOCUMENTS).
    Index {
        /// Files or directories to index.
        paths: Vec<PathBuf>,
    },
    /// Delete every vector from the configured index.
    Purge,
    /// Run a similarity search and print the tool output.
    Search {
        /// Question to search for.
        query: String,
        /// Number of hits to return.
        #[arg(long)]
        top_k: Option<usize>,
        /// Exact-match metadata filter as key=value; repeat to AND several.
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    match cli.command {
        Command::Index { paths } => run_index(config, paths).await,
        Command::Purge => run_purge(config).await,
        Command::Search {
            query,
            top_k,
            filters,
        } => run_search(config, query, top_k, filters).await,
    }
}

async fn run_index(config: &Config, paths: Vec<PathBuf>) -> Result<ExitCode> {
    let roots = if paths.is_empty() {
        vec![config.source_documents.clone()]
    } else {
        paths
    };
    let documents = discover_documents(&roots).context("failed to locate documents")?;
    if documents.is_empty() {
        println!("No PDF documents found.");
        return Ok(ExitCode::SUCCESS);
    }

    let metrics = Arc::new(PipelineMetrics::new());
    let indexer = Indexer::new(
        Arc::new(PdfPageReader),
        build_embedding_client(config).context("failed to build embedding client")?,
        build_vector_store(config).context("failed to build vector store client")?,
        IndexSettings::from_config(config),
        metrics.clone(),
    );

    println!(
        "Indexing {} document(s) into {} (chunk size {})",
        documents.len(),
        indexer.settings().index,
        indexer.settings().chunk_size
    );

    let mut print_progress = |event: IndexProgress<'_>| {
        let line = progress_line(&event);
        match event {
            IndexProgress::ChunkEmbedded {
                completed, total, ..
            } => {
                print!("\r{line}");
                if completed == total {
                    println!();
                }
                let _ = std::io::stdout().flush();
            }
            _ => println!("{line}"),
        }
    };
    let report = indexer.index_documents(&documents, &mut print_progress).await;

    let snapshot = metrics.snapshot();
    println!(
        "Indexed {} of {} document(s): {} vector(s) written, {} embedding call(s), {} failure(s)",
        report.succeeded(),
        report.documents.len(),
        snapshot.vectors_written,
        snapshot.embedding_calls,
        report.failed()
    );

    Ok(if report.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Render one indexing progress event as a line of CLI output.
fn progress_line(event: &IndexProgress<'_>) -> String {
    match event {
        IndexProgress::DocumentStarted { path } => format!("Processing {}", path.display()),
        IndexProgress::ChunksExtracted { pages, chunks, .. } => {
            format!("  {pages} page(s), {chunks} chunk(s)")
        }
        IndexProgress::ChunkEmbedded {
            completed, total, ..
        } => format!("  embedded {completed}/{total}"),
        IndexProgress::DocumentIndexed(outcome) => {
            format!("  upserted {} vector(s)", outcome.vectors_written)
        }
        IndexProgress::DocumentFailed { error, .. } => format!("  failed: {error}"),
    }
}

async fn run_purge(config: &Config) -> Result<ExitCode> {
    let store = build_vector_store(config).context("failed to build vector store client")?;
    let settings = PurgeSettings::from_config(config);
    let metrics = PipelineMetrics::new();

    println!("Purging {}", settings.index);
    let deleted = purge_index(store.as_ref(), &settings, &metrics, &mut |key: &str| {
        println!("Deleted {key}")
    })
    .await
    .context("purge failed")?;

    println!("Removed {deleted} vector(s)");
    Ok(ExitCode::SUCCESS)
}

async fn run_search(
    config: &Config,
    query: String,
    top_k: Option<usize>,
    filters: Vec<String>,
) -> Result<ExitCode> {
    let filters = filters
        .iter()
        .map(|raw| parse_filter_arg(raw))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --filter")?;

    let retriever = Retriever::new(
        build_embedding_client(config).context("failed to build embedding client")?,
        build_vector_store(config).context("failed to build vector store client")?,
        SearchSettings::from_config(config),
        Arc::new(PipelineMetrics::new()),
    );

    let outcome = retriever
        .search(SearchRequest {
            query_text: query,
            top_k,
            filters,
        })
        .await;
    println!("{}", outcome.text());

    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn embedding_progress_is_reported() {
        let path = Path::new("pdf/sleep.pdf");

        assert_eq!(
            progress_line(&IndexProgress::ChunkEmbedded {
                path,
                completed: 3,
                total: 7,
            }),
            "  embedded 3/7"
        );
        assert_eq!(
            progress_line(&IndexProgress::ChunksExtracted {
                path,
                pages: 2,
                chunks: 7,
            }),
            "  2 page(s), 7 chunk(s)"
        );
        assert_eq!(
            progress_line(&IndexProgress::DocumentStarted { path }),
            "Processing pdf/sleep.pdf"
        );
    }
}
