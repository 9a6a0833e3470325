use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use physiboss_models::{
    models::HttpTransport, ActiveModel, DownloadOptions, Error, GithubClient, ModelCatalog,
    Settings,
};
use tracing::{info, metadata::LevelFilter};

/// Browse and install PhysiBoSS models published on GitHub.
#[derive(Parser, Debug)]
#[command(name = "physiboss-models", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user config.json)
    #[arg(long, global = true, env = "PHYSIBOSS_MODELS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models published by the organization
    List,
    /// Print the release asset URL of a model for this platform
    Url { model: String },
    /// Download a model and unpack it into a directory
    Download {
        model: String,
        /// Target directory (defaults to <modelsDir>/<MODEL> or the current directory)
        #[arg(long, short)]
        dir: Option<PathBuf>,
        /// Copy Makefile, main.cpp and config/PhysiCell_settings.xml aside first
        #[arg(long)]
        backup: bool,
    },
    /// Show the descriptor of the model unpacked in a directory
    Info {
        #[arg(long, short)]
        dir: Option<PathBuf>,
    },
}

fn setup_logging() {
    let filter = std::env::var("PHYSIBOSS_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn open_catalog(settings: &Settings) -> Result<ModelCatalog<GithubClient, HttpTransport>> {
    let github = GithubClient::new(settings.github_config()).context("create GitHub client")?;
    let catalog = ModelCatalog::github(github, &settings.organization)
        .with_context(|| format!("list repositories of {}", settings.organization))?;
    Ok(catalog.with_platform(settings.platform()))
}

fn download_bar() -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")?
        .progress_chars("#>-");
    let bar = ProgressBar::new(0);
    bar.set_style(style);
    Ok(bar)
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::List => {
            let catalog = open_catalog(&settings)?;
            info!(organization = catalog.organization(), "listing models");
            for (name, repository) in catalog.models() {
                println!("{name}\t{}", repository.html_url);
            }
        }
        Command::Url { model } => {
            let catalog = open_catalog(&settings)?;
            println!("{}", catalog.resolve_asset_url(&model)?);
        }
        Command::Download { model, dir, backup } => {
            let target = match dir.or_else(|| {
                settings
                    .models_dir
                    .as_ref()
                    .map(|root| root.join(&model))
            }) {
                Some(dir) => dir,
                None => std::env::current_dir().context("resolve current directory")?,
            };
            let catalog = open_catalog(&settings)?;
            let options = DownloadOptions {
                backup,
                backup_root: None,
            };
            let mut active = ActiveModel::new();
            let bar = download_bar()?;
            bar.set_message(model.clone());

            let result = catalog.download_model_with_progress(
                &model,
                &target,
                &options,
                &mut active,
                |progress| {
                    if let Some(total) = progress.total {
                        bar.set_length(total);
                    }
                    bar.set_position(progress.downloaded);
                },
            );
            let outcome = match result {
                Ok(outcome) => {
                    bar.finish();
                    outcome
                }
                Err(error) => {
                    bar.abandon();
                    return Err(error.into());
                }
            };

            for backup in &outcome.backups {
                println!("Backed up {}", backup.display());
            }
            println!("Installed {} into {}", model, target.display());
            println!("Binary: {}", outcome.binary.display());
            println!(
                "SHA-256: {} ({} bytes)",
                outcome.checksum, outcome.bytes_downloaded
            );
            match active.info() {
                Some(info) => print!("{}", serde_yaml::to_string(info)?),
                None => println!("No model.yml found in {}", target.display()),
            }
        }
        Command::Info { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("resolve current directory")?,
            };
            let mut active = ActiveModel::in_dir(&dir);
            active.load_info()?;
            match active.info() {
                Some(info) => print!("{}", serde_yaml::to_string(info)?),
                None => println!("No model loaded in {}", dir.display()),
            }
        }
    }
    Ok(())
}

fn main() {
    setup_logging();
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        if error.downcast_ref::<Error>().is_some_and(Error::is_fatal) {
            eprintln!("! Error untarring the file");
        }
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
