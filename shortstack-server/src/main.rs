use clap::{Parser, Subcommand};
use shortstack::index::corpus::Corpus;
use shortstack::index::LexicalIndex;
use shortstack::types::{IndexBundle, PrecomputedIndex};
use shortstack::{ClientConfig, ShortstackError, WorkerConfig};
use shortstack_http::config::{parse_indexes, DEFAULT_CENSOR_THRESHOLD};
use shortstack_http::{init_tracing, serve_with, ServerConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shortstack")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long, env = "SHORTSTACK_BIND_ADDR", default_value = "127.0.0.1:7700")]
    bind_addr: String,
    /// Served indexes as `name=location[|fallback],...`
    #[arg(long, env = "SHORTSTACK_INDEXES", default_value = "search_index.json")]
    indexes: String,
    /// Hide facet tables with more values than this percentage of the corpus
    #[arg(long, env = "SHORTSTACK_CENSOR_THRESHOLD", default_value_t = DEFAULT_CENSOR_THRESHOLD)]
    censor_threshold: u32,
}

impl Cli {
    fn server_config(&self) -> Result<ServerConfig, ShortstackError> {
        Ok(ServerConfig {
            bind_addr: self.bind_addr.clone(),
            indexes: parse_indexes(&self.indexes)?,
            worker: WorkerConfig::with_censor_threshold(self.censor_threshold),
            client: ClientConfig::from_env(),
        })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the configured indexes (default)
    Serve,
    /// Write a text index for a bundle to disk and emit a bundle pointing at it
    Precompute {
        #[arg(long)]
        bundle: PathBuf,
        #[arg(long)]
        index_dir: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn run_precompute(
    bundle_path: &Path,
    index_dir: &Path,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bundle = IndexBundle::from_slice(&std::fs::read(bundle_path)?)?;
    let corpus = Corpus::from_documents(bundle.documents.clone(), &bundle.mapping);
    if index_dir.exists() && index_dir.read_dir()?.next().is_some() {
        return Err(format!("{} is not empty", index_dir.display()).into());
    }
    let index = LexicalIndex::build_in_dir(index_dir, &bundle.mapping, &corpus)?;

    // The bundle is read later from another working directory.
    let directory = std::fs::canonicalize(index_dir)?;
    bundle.precomputed_index = Some(PrecomputedIndex {
        directory: directory.clone(),
    });
    std::fs::write(out, serde_json::to_vec(&bundle)?)?;

    eprintln!(
        "Indexed {} documents into {}, wrote {}",
        index.num_docs(),
        directory.display(),
        out.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Precompute {
            bundle,
            index_dir,
            out,
        }) => run_precompute(bundle, index_dir, out),
        Some(Command::Serve) | None => {
            let config = cli.server_config()?;
            init_tracing();
            serve_with(config).await
        }
    }
}
