//! Resilient single-item transfers: raw downloads and document exports.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{DriveError, Result};
use crate::item::ExportRule;
use crate::paths;
use crate::remote::RemoteDrive;
use crate::retry::{with_retry, RetryFailure, RetryPolicy};

/// Where a transfer landed and how much it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub path: PathBuf,
    pub bytes: u64,
    /// The primary export failed and the portable-document rule was used.
    pub used_fallback: bool,
}

/// Performs transfers against a remote drive under one retry policy.
pub struct TransferExecutor<'a> {
    drive: &'a dyn RemoteDrive,
    policy: &'a RetryPolicy,
    chunk_size: usize,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(drive: &'a dyn RemoteDrive, policy: &'a RetryPolicy, chunk_size: usize) -> Self {
        Self {
            drive,
            policy,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Stream the raw bytes of `item_id` into `dest`.
    pub async fn download_binary(&self, item_id: &str, dest: &Path) -> Result<u64> {
        self.transfer(item_id, None, dest).await
    }

    /// Stream `item_id` converted to `target_mime` into `dest`.
    pub async fn export_document(
        &self,
        item_id: &str,
        target_mime: &str,
        dest: &Path,
    ) -> Result<u64> {
        self.transfer(item_id, Some(target_mime), dest).await
    }

    /// Export `item_id` into `directory` under `name` with the extension of
    /// `rule`. When that fails and `rule` is not already the portable-document
    /// rule, one more full export cycle is made to a PDF next to it.
    pub async fn export_with_fallback(
        &self,
        item_id: &str,
        name: &str,
        rule: ExportRule,
        directory: &Path,
    ) -> Result<Transferred> {
        let dest = paths::resolve(directory, &paths::exported_name(name, rule.extension));

        let primary_err = match self.export_document(item_id, rule.mime_type, &dest).await {
            Ok(bytes) => {
                return Ok(Transferred {
                    path: dest,
                    bytes,
                    used_fallback: false,
                })
            }
            Err(e) if rule.is_fallback() => return Err(e),
            Err(e) => e,
        };

        tracing::warn!(
            item_id,
            export_mime = rule.mime_type,
            error = %primary_err,
            "Primary export failed, falling back to PDF"
        );

        let fallback = ExportRule::FALLBACK;
        let dest = paths::resolve(directory, &paths::exported_name(name, fallback.extension));
        let bytes = self
            .export_document(item_id, fallback.mime_type, &dest)
            .await?;

        Ok(Transferred {
            path: dest,
            bytes,
            used_fallback: true,
        })
    }

    async fn transfer(&self, item_id: &str, export_mime: Option<&str>, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let policy = self.policy;
        with_retry(policy, |e: &DriveError| policy.mode.allows(e), |attempt| {
            tracing::debug!(item_id, attempt = attempt + 1, dest = %dest.display(), "Transfer attempt");
            self.attempt(item_id, export_mime, dest)
        })
        .await
        .map_err(|failure| match failure {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { attempts, last } => DriveError::TransferExhausted {
                id: item_id.to_string(),
                attempts,
                last: Box::new(last),
            },
        })
    }

    // The destination is truncated on every attempt. A stream that breaks
    // leaves the bytes received so far on disk; callers report the item as
    // failed rather than delete it.
    async fn attempt(&self, item_id: &str, export_mime: Option<&str>, dest: &Path) -> Result<u64> {
        let mut stream = match export_mime {
            Some(mime) => self.drive.open_export(item_id, mime).await?,
            None => self.drive.open_download(item_id).await?,
        };

        let file = File::create(dest).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    if let Err(flush) = writer.flush().await {
                        tracing::debug!(dest = %dest.display(), error = %flush, "Flushing partial file failed");
                    }
                    return Err(e);
                }
            };
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        Ok(written)
    }
}
