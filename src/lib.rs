//! drive_mirror - Mirror a Google Drive folder tree to local storage.
//!
//! Binary files are downloaded verbatim, Google-native documents are
//! exported to Office formats (PDF as the fallback), shortcuts are followed,
//! and name collisions are resolved with a ` (n)` suffix.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use drive_mirror::{Authenticator, ConsoleProgress, DriveClient, MirrorConfig, TreeWalker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_file("service-account.json")?;
//!     let client = DriveClient::new(auth, Duration::from_secs(120))?;
//!     let config = MirrorConfig::default();
//!
//!     let summary = TreeWalker::new(&client, &config)
//!         .run("folder-id", &mut ConsoleProgress)
//!         .await?;
//!     println!("{} files mirrored to {:?}", summary.succeeded, summary.root_dir);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod item;
pub mod models;
pub mod paths;
pub mod progress;
pub mod remote;
pub mod retry;
pub mod transfer;
pub mod url_parser;
pub mod walker;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::DriveClient;
pub use config::MirrorConfig;
pub use error::{DriveError, Result};
pub use item::{ExportRule, ItemKind, NativeSubtype, RemoteItem};
pub use progress::{ConsoleProgress, NoProgress, ProgressReporter};
pub use remote::RemoteDrive;
pub use retry::{RetryMode, RetryPolicy};
pub use transfer::TransferExecutor;
pub use url_parser::extract_folder_id;
pub use walker::{TreeWalker, WalkSummary};
