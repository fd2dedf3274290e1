//! Depth-first mirror of a remote folder tree.
//!
//! The walker keeps an explicit stack of pending `(folder id, local dir)`
//! pairs instead of recursing, lists each folder completely, follows
//! shortcuts through the target embedded in the listing, and hands every
//! terminal item to the [`TransferExecutor`]. Item failures are logged and
//! counted; only a bad root or a failed listing ends the run early with an
//! error.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::MirrorConfig;
use crate::error::{DriveError, Result};
use crate::item::{ItemKind, RemoteItem, SHORTCUT_MIME};
use crate::models::format_size;
use crate::paths;
use crate::progress::ProgressReporter;
use crate::remote::{list_children, RemoteDrive};
use crate::retry::{with_retry, RetryFailure};
use crate::transfer::TransferExecutor;

/// A terminal item found in list-only mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedItem {
    /// Location relative to the mirror root, display name last.
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    /// Byte size reported by the listing; absent for native documents.
    pub size: Option<u64>,
}

/// An item or subfolder that could not be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a completed walk.
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    pub root_name: String,
    pub root_dir: PathBuf,
    /// Terminal items handled, successful or not.
    pub processed: usize,
    pub succeeded: usize,
    /// Failed transfers plus subfolders that could not be created locally.
    pub failed: usize,
    pub fallback_exports: usize,
    pub skipped_shortcuts: usize,
    pub folders_created: usize,
    pub bytes_written: u64,
    /// The item cap ended the walk.
    pub stopped_early: bool,
    pub failures: Vec<ItemFailure>,
    pub listed: Vec<ListedItem>,
}

impl WalkSummary {
    /// Human-readable list-only report showing at most `limit` entries.
    pub fn listing_report(&self, limit: usize) -> String {
        let mut out = format!("{} items in '{}'\n", self.listed.len(), self.root_name);
        for (i, item) in self.listed.iter().take(limit).enumerate() {
            let _ = write!(out, "{:3}. {}  [{}]", i + 1, item.name, item.mime_type);
            if let Some(size) = item.size {
                let _ = write!(out, "  {}", format_size(size));
            }
            out.push('\n');
        }
        if self.listed.len() > limit {
            let _ = writeln!(out, "...and {} more", self.listed.len() - limit);
        }
        out
    }
}

struct PendingFolder {
    id: String,
    dir: PathBuf,
    /// Relative to the mirror root.
    rel: PathBuf,
    /// Ids from the root down to this folder, inclusive.
    ancestors: Vec<String>,
}

/// Walks one remote tree into the local output root.
pub struct TreeWalker<'a> {
    drive: &'a dyn RemoteDrive,
    config: &'a MirrorConfig,
}

impl<'a> TreeWalker<'a> {
    pub fn new(drive: &'a dyn RemoteDrive, config: &'a MirrorConfig) -> Self {
        Self { drive, config }
    }

    /// Mirror (or, in list-only mode, enumerate) the folder `root_id`.
    pub async fn run(
        &self,
        root_id: &str,
        progress: &mut dyn ProgressReporter,
    ) -> Result<WalkSummary> {
        self.config.validate()?;

        let root = self.fetch_item(root_id).await?;
        if !root.kind.is_folder() {
            return Err(DriveError::NotAFolder {
                id: root.id,
                mime_type: root.mime_type,
            });
        }

        let root_dir = self
            .config
            .output_root
            .join(paths::sanitize_name(&root.name));
        if !self.config.list_only {
            fs::create_dir_all(&root_dir).await?;
        }
        tracing::info!(root = %root.name, dir = %root_dir.display(), "Starting walk");

        let mut summary = WalkSummary {
            root_name: root.name.clone(),
            root_dir: root_dir.clone(),
            ..WalkSummary::default()
        };
        let executor =
            TransferExecutor::new(self.drive, &self.config.retry, self.config.chunk_size);
        let mut discovered = 0usize;

        let mut stack = vec![PendingFolder {
            id: root.id.clone(),
            dir: root_dir,
            rel: PathBuf::new(),
            ancestors: vec![root.id],
        }];

        while let Some(folder) = stack.pop() {
            let children = list_children(self.drive, &folder.id, &self.config.retry).await?;

            for child in children {
                let Some(item) = self.resolve_shortcut(child, &mut summary).await else {
                    continue;
                };
                let local_name = paths::sanitize_name(&item.name);

                if item.kind.is_folder() {
                    if folder.ancestors.contains(&item.id) {
                        tracing::warn!(name = %item.name, id = %item.id, "Skipping shortcut cycle");
                        summary.skipped_shortcuts += 1;
                        continue;
                    }

                    let dir = if self.config.list_only {
                        folder.dir.join(&local_name)
                    } else {
                        let dir = paths::resolve_dir(&folder.dir, &local_name);
                        if let Err(e) = fs::create_dir_all(&dir).await {
                            tracing::warn!("Failed to create folder {}: {}", dir.display(), e);
                            summary.failed += 1;
                            summary.failures.push(ItemFailure {
                                name: item.name,
                                error: e.to_string(),
                            });
                            continue;
                        }
                        summary.folders_created += 1;
                        dir
                    };

                    let mut ancestors = folder.ancestors.clone();
                    ancestors.push(item.id.clone());
                    stack.push(PendingFolder {
                        id: item.id,
                        dir,
                        rel: folder.rel.join(&local_name),
                        ancestors,
                    });
                    continue;
                }

                discovered += 1;
                if self.config.list_only {
                    summary.listed.push(ListedItem {
                        path: folder.rel.join(&local_name),
                        name: item.name,
                        mime_type: item.mime_type,
                        size: item.size,
                    });
                    summary.processed += 1;
                } else {
                    self.transfer_item(&executor, &item, &local_name, &folder.dir, &mut summary)
                        .await;
                    summary.processed += 1;
                    progress.advance(summary.processed, discovered, &item.name);
                }

                if self
                    .config
                    .max_items
                    .is_some_and(|max| summary.processed >= max.get())
                {
                    tracing::info!(processed = summary.processed, "Item cap reached, stopping");
                    summary.stopped_early = true;
                    return Ok(summary);
                }
            }
        }

        Ok(summary)
    }

    async fn fetch_item(&self, id: &str) -> Result<RemoteItem> {
        let policy = &self.config.retry;
        let meta = with_retry(policy, |e: &DriveError| policy.mode.allows(e), |_| {
            self.drive.get_item(id)
        })
        .await
        .map_err(RetryFailure::into_inner)?;
        Ok(RemoteItem::classify(meta))
    }

    /// Replace a shortcut by its target, keeping the shortcut's own name.
    /// Returns `None` for shortcuts that cannot be followed.
    async fn resolve_shortcut(
        &self,
        item: RemoteItem,
        summary: &mut WalkSummary,
    ) -> Option<RemoteItem> {
        let ItemKind::Shortcut {
            target_id,
            target_mime,
        } = item.kind.clone()
        else {
            return Some(item);
        };
        let Some(target_id) = target_id else {
            tracing::debug!(name = %item.name, "Skipping broken shortcut");
            summary.skipped_shortcuts += 1;
            return None;
        };

        let (target_mime, size) = match target_mime {
            Some(mime) => (mime, None),
            None => match self.fetch_item(&target_id).await {
                Ok(target) => (target.mime_type, target.size),
                Err(e) => {
                    tracing::warn!(name = %item.name, error = %e, "Failed to resolve shortcut");
                    summary.skipped_shortcuts += 1;
                    return None;
                }
            },
        };

        if target_mime == SHORTCUT_MIME {
            summary.skipped_shortcuts += 1;
            return None;
        }

        Some(RemoteItem {
            kind: ItemKind::from_mime(&target_mime),
            id: target_id,
            name: item.name,
            mime_type: target_mime,
            size,
        })
    }

    async fn transfer_item(
        &self,
        executor: &TransferExecutor<'_>,
        item: &RemoteItem,
        local_name: &str,
        dir: &Path,
        summary: &mut WalkSummary,
    ) {
        let (verb, result) = match item.export_rule() {
            Some(rule) => (
                "export",
                executor
                    .export_with_fallback(&item.id, local_name, rule, dir)
                    .await
                    .map(|t| {
                        if t.used_fallback {
                            summary.fallback_exports += 1;
                        }
                        t.bytes
                    }),
            ),
            None => {
                let dest = paths::resolve(dir, local_name);
                ("download", executor.download_binary(&item.id, &dest).await)
            }
        };

        match result {
            Ok(bytes) => {
                summary.succeeded += 1;
                summary.bytes_written += bytes;
            }
            Err(e) => {
                tracing::warn!("Failed to {} {}: {}", verb, item.name, e);
                summary.failed += 1;
                summary.failures.push(ItemFailure {
                    name: item.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}
