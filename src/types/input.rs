//! Input file and file-kind definitions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FileError;

/// The handling strategy a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// JPEG or PNG image
    Image,
    /// PDF document, always uploaded to the remote service
    Pdf,
    /// HTML page (saved exam portals, LMS exports)
    Html,
    /// Anything else; reported to the caller as skipped
    Unrecognized,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Image => write!(f, "image"),
            FileKind::Pdf => write!(f, "pdf"),
            FileKind::Html => write!(f, "html"),
            FileKind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// A file that reaches the model as a standalone captioned asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Pdf,
}

impl AssetKind {
    /// Caption prefix placed after an asset of this kind.
    pub fn caption_label(&self) -> &'static str {
        match self {
            AssetKind::Image => "Image filename",
            AssetKind::Pdf => "PDF filename",
        }
    }
}

/// A file handed to the pipeline.
///
/// Immutable once read; consumed once by a pipeline run.
#[derive(Clone)]
pub struct InputFile {
    name: String,
    declared_type: String,
    raw_bytes: Vec<u8>,
}

impl InputFile {
    /// Create an input file from an in-memory upload.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, raw_bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            raw_bytes,
        }
    }

    /// Read a file from disk, guessing its declared type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let raw_bytes = tokio::fs::read(path).await?;
        let declared_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or_default()
            .to_string();

        Ok(Self::new(display_name(path), declared_type, raw_bytes))
    }

    /// Like [`InputFile::from_path`], with the failure tied to the file name
    /// so it can be reported as a skipped file.
    pub async fn load(path: &Path) -> Result<Self, FileError> {
        Self::from_path(path)
            .await
            .map_err(|source| FileError::Unreadable {
                name: display_name(path),
                source,
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("size_bytes", &self.raw_bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let file = InputFile::new("Paper.HTM", "", Vec::new());
        assert_eq!(file.extension().as_deref(), Some("htm"));

        let file = InputFile::new("README", "", Vec::new());
        assert_eq!(file.extension(), None);
    }

    #[tokio::test]
    async fn test_from_path_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023_exam.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let file = InputFile::from_path(&path).await.unwrap();

        assert_eq!(file.name(), "2023_exam.pdf");
        assert_eq!(file.declared_type(), "application/pdf");
        assert_eq!(file.raw_bytes(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_load_reports_missing_file_by_name() {
        let dir = tempfile::tempdir().unwrap();

        let err = InputFile::load(&dir.path().join("2021_exam.pdf")).await.unwrap_err();

        assert!(matches!(err, FileError::Unreadable { .. }));
        assert_eq!(err.file_name(), "2021_exam.pdf");
    }

    #[test]
    fn test_asset_caption_labels() {
        assert_eq!(AssetKind::Image.caption_label(), "Image filename");
        assert_eq!(AssetKind::Pdf.caption_label(), "PDF filename");
    }
}
