//! Allow-list of document types accepted for upload.

use std::fmt;
use std::path::Path;

/// Document formats the File Search store is asked to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Plain UTF-8 text.
    Text,
    /// Markdown source.
    Markdown,
}

impl DocumentKind {
    /// Every accepted kind, in the order presented to users.
    pub const ALL: [DocumentKind; 3] = [Self::Pdf, Self::Text, Self::Markdown];

    /// Classify a file by its extension, ignoring case.
    ///
    /// Names without an extension, including dot-files such as `.md`, are not classified.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Canonical extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Text => ".txt",
            Self::Markdown => ".md",
        }
    }

    /// MIME type announced to the provider.
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain",
            Self::Markdown => "text/markdown",
        }
    }

    /// Comma separated list of accepted extensions, for error messages.
    pub fn allowed_extensions() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
