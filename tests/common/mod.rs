//! In-memory remote drive used by the walker and transfer tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use drive_mirror::item::{FOLDER_MIME, SHORTCUT_MIME};
use drive_mirror::models::{FileListResponse, FileMetadata, ShortcutDetails};
use drive_mirror::remote::{MediaStream, RemoteDrive};
use drive_mirror::{DriveError, MirrorConfig, Result, RetryPolicy};

pub const DOC_MIME: &str = "application/vnd.google-apps.document";
pub const SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PDF_MIME: &str = "application/pdf";

pub fn file(id: &str, name: &str, mime: &str) -> FileMetadata {
    FileMetadata {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: Some(mime.to_string()),
        shortcut_details: None,
        size: None,
    }
}

pub fn folder(id: &str, name: &str) -> FileMetadata {
    file(id, name, FOLDER_MIME)
}

pub fn shortcut(id: &str, name: &str, target: Option<&str>, target_mime: Option<&str>) -> FileMetadata {
    FileMetadata {
        shortcut_details: Some(ShortcutDetails {
            target_id: target.map(str::to_string),
            target_mime_type: target_mime.map(str::to_string),
        }),
        ..file(id, name, SHORTCUT_MIME)
    }
}

fn api_error(status: u16) -> DriveError {
    DriveError::ApiError {
        status,
        reason: None,
        message: format!("scripted {}", status),
    }
}

/// Scripted failure sequence for one call key.
enum Script {
    Sequence(VecDeque<u16>),
    Always(u16),
}

/// Remote drive whose tree, content and failures are set up by the test.
///
/// Call keys: `get:<id>`, `list:<id>`, `download:<id>`, `export:<id>:<mime>`.
#[derive(Default)]
pub struct FakeDrive {
    items: HashMap<String, FileMetadata>,
    pages: HashMap<String, Vec<Vec<FileMetadata>>>,
    downloads: HashMap<String, Vec<u8>>,
    exports: HashMap<(String, String), Vec<u8>>,
    scripts: Mutex<HashMap<String, Script>>,
    /// Streams for a key that break after `.0` bytes, `.1` more times.
    breaks: Mutex<HashMap<String, (usize, Option<u32>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata answered by `get_item`.
    pub fn item(mut self, meta: FileMetadata) -> Self {
        self.items.insert(meta.id.clone(), meta);
        self
    }

    /// Add children to `parent` as a single page.
    pub fn children(mut self, parent: &str, children: Vec<FileMetadata>) -> Self {
        for child in &children {
            self.items.insert(child.id.clone(), child.clone());
        }
        self.pages.insert(parent.to_string(), vec![children]);
        self
    }

    /// Add children to `parent` split across explicit pages.
    pub fn paged_children(mut self, parent: &str, pages: Vec<Vec<FileMetadata>>) -> Self {
        for child in pages.iter().flatten() {
            self.items.insert(child.id.clone(), child.clone());
        }
        self.pages.insert(parent.to_string(), pages);
        self
    }

    pub fn content(mut self, id: &str, bytes: &[u8]) -> Self {
        self.downloads.insert(id.to_string(), bytes.to_vec());
        self
    }

    pub fn export(mut self, id: &str, mime: &str, bytes: &[u8]) -> Self {
        self.exports
            .insert((id.to_string(), mime.to_string()), bytes.to_vec());
        self
    }

    /// The next calls for `key` fail with these statuses, in order.
    pub fn fail_with(self, key: &str, statuses: &[u16]) -> Self {
        self.scripts.lock().unwrap().insert(
            key.to_string(),
            Script::Sequence(statuses.iter().copied().collect()),
        );
        self
    }

    /// Every call for `key` fails with `status`.
    pub fn always_fail(self, key: &str, status: u16) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(key.to_string(), Script::Always(status));
        self
    }

    /// The next `times` streams opened for `key` yield `after` bytes and
    /// then fail with a 503.
    pub fn break_stream(self, key: &str, after: usize, times: u32) -> Self {
        self.breaks
            .lock()
            .unwrap()
            .insert(key.to_string(), (after, Some(times)));
        self
    }

    /// Every stream opened for `key` fails with a 503 after `after` bytes.
    pub fn always_break_stream(self, key: &str, after: usize) -> Self {
        self.breaks
            .lock()
            .unwrap()
            .insert(key.to_string(), (after, None));
        self
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn enter(&self, key: String) -> Result<()> {
        self.calls.lock().unwrap().push(key.clone());
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&key) {
            Some(Script::Always(status)) => Err(api_error(*status)),
            Some(Script::Sequence(queue)) => match queue.pop_front() {
                Some(status) => Err(api_error(status)),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    fn stream(&self, key: &str, bytes: &[u8]) -> MediaStream {
        let cut = match self.breaks.lock().unwrap().get_mut(key) {
            Some((after, None)) => Some(*after),
            Some((after, Some(remaining))) if *remaining > 0 => {
                *remaining -= 1;
                Some(*after)
            }
            _ => None,
        };

        let body = match cut {
            Some(after) => &bytes[..after.min(bytes.len())],
            None => bytes,
        };
        let mut chunks: Vec<Result<Bytes>> = body
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if cut.is_some() {
            chunks.push(Err(api_error(503)));
        }
        futures::stream::iter(chunks).boxed()
    }
}

#[async_trait]
impl RemoteDrive for FakeDrive {
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileListResponse> {
        self.enter(format!("list:{}", folder_id))?;
        let pages = self.pages.get(folder_id).cloned().unwrap_or_default();
        let index: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);

        let files = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(FileListResponse {
            files,
            next_page_token,
        })
    }

    async fn get_item(&self, id: &str) -> Result<FileMetadata> {
        self.enter(format!("get:{}", id))?;
        self.items.get(id).cloned().ok_or_else(|| api_error(404))
    }

    async fn open_download(&self, id: &str) -> Result<MediaStream> {
        let key = format!("download:{}", id);
        self.enter(key.clone())?;
        let bytes = self.downloads.get(id).ok_or_else(|| api_error(404))?;
        Ok(self.stream(&key, bytes))
    }

    async fn open_export(&self, id: &str, mime_type: &str) -> Result<MediaStream> {
        let key = format!("export:{}:{}", id, mime_type);
        self.enter(key.clone())?;
        let bytes = self
            .exports
            .get(&(id.to_string(), mime_type.to_string()))
            .ok_or_else(|| api_error(400))?;
        Ok(self.stream(&key, bytes))
    }
}

/// Retry policy with the real budget and no waiting.
pub fn instant_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub fn config_for(output_root: &std::path::Path) -> MirrorConfig {
    MirrorConfig {
        output_root: output_root.to_path_buf(),
        retry: instant_retry(),
        chunk_size: 16,
        ..MirrorConfig::default()
    }
}
