//! Typed view of remote Drive nodes and the export policy for native documents.

use crate::models::FileMetadata;

/// MIME type Drive uses for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME type Drive uses for shortcuts.
pub const SHORTCUT_MIME: &str = "application/vnd.google-apps.shortcut";

/// Prefix shared by every Google-native MIME type.
pub const NATIVE_PREFIX: &str = "application/vnd.google-apps.";

/// Known Google-native document families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeSubtype {
    Document,
    Spreadsheet,
    Presentation,
    Drawing,
}

impl NativeSubtype {
    /// Look up the subtype for a raw native MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.strip_prefix(NATIVE_PREFIX)? {
            "document" => Some(Self::Document),
            "spreadsheet" => Some(Self::Spreadsheet),
            "presentation" => Some(Self::Presentation),
            "drawing" => Some(Self::Drawing),
            _ => None,
        }
    }
}

/// Target format for exporting a native document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRule {
    pub mime_type: &'static str,
    /// File extension without the leading dot.
    pub extension: &'static str,
}

impl ExportRule {
    /// Portable-document rule used for unmapped subtypes and as the
    /// second attempt when a primary export fails.
    pub const FALLBACK: ExportRule = ExportRule {
        mime_type: "application/pdf",
        extension: "pdf",
    };

    /// Primary export rule for a native subtype.
    pub fn for_subtype(subtype: Option<NativeSubtype>) -> ExportRule {
        match subtype {
            Some(NativeSubtype::Document) => ExportRule {
                mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                extension: "docx",
            },
            Some(NativeSubtype::Spreadsheet) => ExportRule {
                mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                extension: "xlsx",
            },
            Some(NativeSubtype::Presentation) => ExportRule {
                mime_type:
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                extension: "pptx",
            },
            Some(NativeSubtype::Drawing) => ExportRule {
                mime_type: "image/png",
                extension: "png",
            },
            None => Self::FALLBACK,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.mime_type == Self::FALLBACK.mime_type
    }
}

/// Classification of a remote node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Ordinary binary file, downloaded verbatim.
    File,
    Folder,
    /// Reference to another item. The target is carried unresolved.
    Shortcut {
        target_id: Option<String>,
        target_mime: Option<String>,
    },
    /// Google-native document that must be exported. `None` means an
    /// unrecognised native type, exported with the fallback rule.
    NativeDocument(Option<NativeSubtype>),
}

impl ItemKind {
    /// Classify a MIME type that is not a shortcut.
    pub fn from_mime(mime: &str) -> ItemKind {
        if mime == FOLDER_MIME {
            ItemKind::Folder
        } else if mime.starts_with(NATIVE_PREFIX) {
            ItemKind::NativeDocument(NativeSubtype::from_mime(mime))
        } else {
            ItemKind::File
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ItemKind::Folder)
    }
}

/// A remote node as seen in one listing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub kind: ItemKind,
    pub size: Option<u64>,
}

impl RemoteItem {
    /// Build a typed item from raw metadata. Shortcut targets are not
    /// followed here.
    pub fn classify(meta: FileMetadata) -> RemoteItem {
        let mime_type = meta
            .mime_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let kind = if mime_type == SHORTCUT_MIME {
            let details = meta.shortcut_details.unwrap_or_default();
            ItemKind::Shortcut {
                target_id: details.target_id.filter(|id| !id.is_empty()),
                target_mime: details.target_mime_type,
            }
        } else {
            ItemKind::from_mime(&mime_type)
        };

        RemoteItem {
            id: meta.id,
            name: meta.name,
            mime_type,
            kind,
            size: meta.size,
        }
    }

    /// Export rule for a native document, `None` for anything else.
    pub fn export_rule(&self) -> Option<ExportRule> {
        match self.kind {
            ItemKind::NativeDocument(subtype) => Some(ExportRule::for_subtype(subtype)),
            _ => None,
        }
    }
}
