//! drive_mirror CLI - Download a shared Google Drive folder tree.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_mirror::config::{DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT_DIR};
use drive_mirror::{
    extract_folder_id, Authenticator, ConsoleProgress, DriveClient, MirrorConfig, RetryMode,
    RetryPolicy, TreeWalker,
};

/// Entries shown by `--list` before the remainder is summarised.
const LIST_PREVIEW: usize = 50;

/// Mirror a Google Drive folder (and everything below it) to local storage.
#[derive(Parser)]
#[command(name = "drive_mirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder URL or ID.
    folder: String,

    /// Local output root; the folder is saved under `<out>/<folder name>`.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out: PathBuf,

    /// Only list the files that would be downloaded.
    #[arg(long)]
    list: bool,

    /// Stop after this many files (0 means no limit).
    #[arg(long, default_value_t = 0)]
    max: usize,

    /// Write buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk: usize,

    /// Network timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Retry every failure, not only transient HTTP statuses.
    #[arg(long)]
    retry_all_errors: bool,

    /// Do not pass acknowledgeAbuse when downloading binary files.
    #[arg(long)]
    no_acknowledge_abuse: bool,

    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// OAuth access token to use instead of a service account.
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drive_mirror=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let auth = match (&cli.access_token, &cli.credentials) {
        (Some(token), _) => Authenticator::from_access_token(token.clone()),
        (None, Some(path)) => Authenticator::from_file(path)
            .with_context(|| format!("Failed to load credentials from {:?}", path))?,
        (None, None) => bail!("Provide --credentials or --access-token"),
    };

    let folder_id = extract_folder_id(&cli.folder)
        .with_context(|| format!("Invalid folder URL or ID: {}", cli.folder))?;

    let config = MirrorConfig {
        output_root: cli.out,
        list_only: cli.list,
        max_items: NonZeroUsize::new(cli.max),
        chunk_size: cli.chunk,
        timeout: Duration::from_secs(cli.timeout),
        retry: RetryPolicy {
            mode: if cli.retry_all_errors {
                RetryMode::AnyError
            } else {
                RetryMode::TransientStatus
            },
            ..RetryPolicy::default()
        },
        acknowledge_abuse: !cli.no_acknowledge_abuse,
    };
    config.validate()?;

    if !config.list_only {
        std::fs::create_dir_all(&config.output_root).with_context(|| {
            format!("Failed to create directory: {:?}", config.output_root)
        })?;
    }

    let client = DriveClient::new(auth, config.timeout)?
        .with_acknowledge_abuse(config.acknowledge_abuse);

    let summary = TreeWalker::new(&client, &config)
        .run(&folder_id, &mut ConsoleProgress)
        .await
        .with_context(|| format!("Failed to mirror folder: {}", folder_id))?;

    if config.list_only {
        print!("{}", summary.listing_report(LIST_PREVIEW));
        return Ok(());
    }

    let saved_to = std::fs::canonicalize(&summary.root_dir).unwrap_or(summary.root_dir.clone());
    println!(
        "\nDone. {} saved, {} failed, {} skipped shortcuts ({}).",
        summary.succeeded,
        summary.failed,
        summary.skipped_shortcuts,
        drive_mirror::models::format_size(summary.bytes_written)
    );
    if summary.stopped_early {
        println!("Stopped after {} files (--max).", summary.processed);
    }
    println!("Saved to: {}", saved_to.display());

    Ok(())
}
