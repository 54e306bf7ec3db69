mod error;
mod manifest;

use crate::error::{ErrorKind, Result};
use crate::manifest::{Manifest, Report};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use verdant_config::Config;
use verdant_fetch::HttpFetcher;
use verdant_media::{Acquirer, DisplayReference, Role, resolve, slugify, validate_batch};
use verdant_storage::backend::LocalBackend;

#[derive(Parser)]
#[command(name = "verdant", version, about = "Fetch, optimize and store remote images for content items")]
struct Cli {
    /// Config file (.toml, .yaml or .json) layered over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// More logging; repeat for more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Acquire every image in a manifest and print display references as JSON
    Acquire {
        manifest: PathBuf,
        /// Storage root, overriding `storage.root`
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Print the storage path of a slot, relative to the storage root
    Resolve {
        slug: String,
        #[arg(value_enum)]
        role: RoleArg,
        #[arg(long, default_value_t = 0)]
        order: u32,
    },
    /// Turn a title into an owner slug
    Slug {
        #[arg(required = true)]
        title: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Thumbnail,
    Featured,
    Gallery,
}
impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Thumbnail => Role::Thumbnail,
            RoleArg::Featured => Role::Featured,
            RoleArg::Gallery => Role::Gallery,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// Logs go to stderr so that stdout stays machine-readable. `RUST_LOG`
/// overrides the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Acquire { manifest, root } => {
            let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
            let report = acquire(&config, &manifest, root).await?;
            let json = serde_json::to_string_pretty(&report).or_raise(|| ErrorKind::Output)?;
            println!("{json}");
        },
        Command::Resolve { slug, role, order } => {
            let path = resolve(&slug, role.into(), order).or_raise(|| ErrorKind::Resolve)?;
            println!("{}", DisplayReference::Local(path));
        },
        Command::Slug { title } => println!("{}", slugify(&title.join(" "))),
    }
    Ok(())
}

async fn acquire(config: &Config, manifest: &std::path::Path, root: Option<PathBuf>) -> Result<Report> {
    let manifest = Manifest::read(manifest)?;
    let owner = manifest.owner.to_owner()?;
    // The backend creates the storage root; nothing may touch disk for a
    // batch that is going to be rejected.
    validate_batch(&owner, &manifest.requests, config.batch.max_slots).or_raise(|| ErrorKind::Batch)?;

    let root = match root {
        Some(root) => std::path::absolute(&root).or_raise(|| ErrorKind::Storage)?,
        None => config.storage.root.clone(),
    };
    let backend = LocalBackend::new("local", &root).or_raise(|| ErrorKind::Storage)?;
    let fetcher = HttpFetcher::new(config.fetch.options()).or_raise(|| ErrorKind::Fetch)?;
    let acquirer = Acquirer::new(Arc::new(fetcher), Arc::new(backend))
        .with_optimize_options(config.optimize.options())
        .with_concurrency(config.batch.concurrency)
        .with_max_slots(config.batch.max_slots);

    tracing::info!(owner = %owner.id, slug = %owner.slug, root = %root.display(), "Acquiring media");
    let media = acquirer.acquire_batch(&owner, manifest.requests).await.or_raise(|| ErrorKind::Batch)?;
    Ok(Report::new(&media, &config.placeholders))
}
