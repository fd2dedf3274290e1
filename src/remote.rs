//! Contract of the remote file service consumed by the mirror.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::{DriveError, Result};
use crate::item::RemoteItem;
use crate::models::{FileListResponse, FileMetadata};
use crate::retry::{with_retry, RetryFailure, RetryPolicy};

/// Content of a remote item, delivered chunk by chunk. The end of the
/// stream is the completion signal.
pub type MediaStream = BoxStream<'static, Result<Bytes>>;

/// Authenticated access to a remote file service.
#[async_trait]
pub trait RemoteDrive: Send + Sync {
    /// Fetch one page of the children of `folder_id`.
    async fn list_page(&self, folder_id: &str, page_token: Option<&str>)
        -> Result<FileListResponse>;

    /// Get metadata of a single item.
    async fn get_item(&self, id: &str) -> Result<FileMetadata>;

    /// Open the raw bytes of a binary file.
    async fn open_download(&self, id: &str) -> Result<MediaStream>;

    /// Open the content of a native document converted to `mime_type`.
    async fn open_export(&self, id: &str, mime_type: &str) -> Result<MediaStream>;
}

/// List every child of `folder_id`, following page tokens until the
/// last page. Each page fetch is retried according to `policy`; a page
/// that still fails ends the listing with `ListingFailed`.
pub async fn list_children(
    drive: &dyn RemoteDrive,
    folder_id: &str,
    policy: &RetryPolicy,
) -> Result<Vec<RemoteItem>> {
    let mut children = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let token = page_token.as_deref();
        let page = with_retry(policy, |e: &DriveError| policy.mode.allows(e), |_| {
            drive.list_page(folder_id, token)
        })
        .await
        .map_err(|failure| DriveError::ListingFailed {
            folder_id: folder_id.to_string(),
            source: Box::new(match failure {
                RetryFailure::Fatal(e) => e,
                RetryFailure::Exhausted { attempts, last } => DriveError::TransferExhausted {
                    id: folder_id.to_string(),
                    attempts,
                    last: Box::new(last),
                },
            }),
        })?;

        children.extend(page.files.into_iter().map(RemoteItem::classify));

        match page.next_page_token {
            Some(next) if !next.is_empty() => page_token = Some(next),
            _ => break,
        }
    }

    tracing::debug!(folder_id, count = children.len(), "Listed folder");
    Ok(children)
}
