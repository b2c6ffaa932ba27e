use crate::error::AppError;
use crate::extractors;
use crate::metadata::{Extraction, MetadataMap};
use std::path::Path;

/// Extensions the upload form accepts. mp3, mp4 and xlsx are taken in but
/// have no extraction handler yet; they map to `FileKind::Unsupported`.
pub const ACCEPTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "pdf", "docx", "xlsx", "mp3", "mp4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Pdf,
    OfficeDocument,
    Unsupported,
}

impl FileKind {
    pub fn from_extension(extension: &str) -> Result<Self, AppError> {
        let extension = extension.to_lowercase();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::UnsupportedMedia(extension));
        }
        Ok(match extension.as_str() {
            "jpg" | "jpeg" | "png" => FileKind::Image,
            "pdf" => FileKind::Pdf,
            "docx" => FileKind::OfficeDocument,
            _ => FileKind::Unsupported,
        })
    }
}

/// Lowercased extension of an uploaded filename, empty if there is none.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn extract(kind: FileKind, path: &Path) -> Result<Extraction, AppError> {
    match kind {
        FileKind::Image => extractors::image::extract(path),
        FileKind::Pdf => extractors::pdf::extract(path).map(|metadata| Extraction {
            metadata,
            gps: None,
        }),
        FileKind::OfficeDocument => extractors::office::extract(path).map(|metadata| Extraction {
            metadata,
            gps: None,
        }),
        FileKind::Unsupported => {
            log::info!("No extraction handler for {:?}, returning empty metadata", path);
            Ok(Extraction {
                metadata: MetadataMap::new(),
                gps: None,
            })
        }
    }
}
