use std::path::PathBuf;

use clap::Parser;
use recall_core::config::RecallConfig;
use recall_host::RecallApp;
use tracing_subscriber::EnvFilter;

/// Runs the memory host for a single project: cold-starts the index, then
/// watches the tree and answers worker-bridge requests until killed.
#[derive(Parser)]
struct Cli {
    /// Project root to index and watch.
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Project id memories and graph nodes are scoped under.
    #[arg(long)]
    project_id: Option<String>,

    /// Path to a `recall.toml` config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = RecallConfig::load(cli.config.as_deref())?;
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let project_id = cli.project_id.unwrap_or_else(|| project_root.display().to_string());

    // `_handle` is the Consumer API surface; a real agent loop embedding
    // this binary's library crate would hand it to its own worker thread
    // before calling `run()`.
    let (app, _handle) = RecallApp::bootstrap(config, project_id, project_root)?;
    app.run()?;
    Ok(())
}
