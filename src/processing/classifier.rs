//! Routes input files to a handling strategy.

use std::path::Path;

use crate::types::{FileKind, InputFile};

/// MIME types that carry no useful routing information.
const GENERIC_TYPES: &[&str] = &[
    "",
    "application/octet-stream",
    "binary/octet-stream",
    "application/unknown",
];

/// Classifies files by declared MIME type, then by file-name suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileClassifier;

impl FileClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an input file.
    ///
    /// A recognized MIME type wins. Generic or unknown types fall back to
    /// case-insensitive suffix matching.
    pub fn classify(&self, file: &InputFile) -> FileKind {
        if let Some(kind) = Self::from_mime(file.declared_type()) {
            return kind;
        }
        self.classify_name(file.name())
    }

    /// Classify by file-name suffix alone.
    pub fn classify_name(&self, name: &str) -> FileKind {
        Path::new(name)
            .extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(FileKind::Unrecognized)
    }

    fn from_mime(declared_type: &str) -> Option<FileKind> {
        let mime = declared_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if GENERIC_TYPES.contains(&mime.as_str()) {
            return None;
        }

        match mime.as_str() {
            "image/jpeg" | "image/jpg" | "image/png" => Some(FileKind::Image),
            "application/pdf" => Some(FileKind::Pdf),
            m if m.contains("html") => Some(FileKind::Html),
            _ => None,
        }
    }

    fn from_extension(ext: &str) -> FileKind {
        match ext {
            "jpg" | "jpeg" | "png" => FileKind::Image,
            "pdf" => FileKind::Pdf,
            "html" | "htm" => FileKind::Html,
            _ => FileKind::Unrecognized,
        }
    }
}
