//! File descriptors handed over by the host, and the accepted MIME types.

use serde::{Deserialize, Serialize};

pub const MIME_CSV: &str = "text/csv";
pub const MIME_CSV_UTF8: &str = "text/csv; charset=utf-8";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The only MIME types the preview is mounted for.
pub const SUPPORTED_MIME_TYPES: [&str; 3] = [MIME_CSV, MIME_CSV_UTF8, MIME_XLSX];

/// ZIP local file header signature; every XLSX starts with it.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Whether the host should mount the preview for this MIME type.
#[must_use]
pub fn is_supported(mime_type: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime_type)
}

/// Container format of a spreadsheet file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Format for an accepted MIME type; `None` for anything else.
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            MIME_CSV | MIME_CSV_UTF8 => Some(Self::Csv),
            MIME_XLSX => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Guess from content: a ZIP container is XLSX, anything else is CSV text.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(ZIP_MAGIC) {
            Self::Xlsx
        } else {
            Self::Csv
        }
    }

    /// Guess from a file name's extension (used by the CLI).
    #[must_use]
    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1;
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("xlsx") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => MIME_CSV,
            Self::Xlsx => MIME_XLSX,
        }
    }
}

/// File metadata from the host: an uploaded file (`id`) or an external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl FileDescriptor {
    /// A file uploaded to the chat server.
    #[must_use]
    pub fn hosted(id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            mime_type: mime_type.into(),
            link: None,
        }
    }

    /// A file referenced by an external link.
    #[must_use]
    pub fn external(link: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: None,
            mime_type: mime_type.into(),
            link: Some(link.into()),
        }
    }

    /// External files carry no server-side id.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.id.as_deref().map_or(true, str::is_empty)
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        is_supported(&self.mime_type)
    }

    #[must_use]
    pub fn format(&self) -> Option<FileFormat> {
        FileFormat::from_mime(&self.mime_type)
    }

    /// Download URL: the link for external files, else `template` with `{id}` filled in.
    #[must_use]
    pub fn resolve_url(&self, template: &str) -> Option<String> {
        if self.is_external() {
            return self.link.clone().filter(|l| !l.is_empty());
        }
        self.id.as_deref().map(|id| template.replace("{id}", id))
    }
}
