use crate::dispatch::{self, FileKind};
use crate::error::AppError;
use crate::metadata::{Extraction, GpsCoordinates, MetadataMap};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// All state derived from one uploaded file. Replaced wholesale on the next
/// upload; the backing temp file is removed when the session is dropped.
#[derive(Debug)]
pub struct UploadSession {
    filename: String,
    extension: String,
    kind: FileKind,
    bytes: Vec<u8>,
    // Keeps the on-disk copy alive for path-based extractors.
    _temp_file: NamedTempFile,
    original: MetadataMap,
    edits: HashMap<String, String>,
    gps: Option<GpsCoordinates>,
}

impl UploadSession {
    /// Writes the upload to a scoped temp file, runs the extraction handler
    /// for its extension, and captures the result as the session's original
    /// metadata.
    pub fn from_upload(filename: &str, bytes: Vec<u8>) -> Result<Self, AppError> {
        let extension = dispatch::extension_of(filename);
        let kind = FileKind::from_extension(&extension)?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("metadata_hub_")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        temp_file.write_all(&bytes)?;
        temp_file.flush()?;
        log::debug!("Upload {} staged at {:?}", filename, temp_file.path());

        let Extraction { metadata, gps } = dispatch::extract(kind, temp_file.path())?;

        Ok(Self {
            filename: filename.to_string(),
            extension,
            kind,
            bytes,
            _temp_file: temp_file,
            original: metadata,
            edits: HashMap::new(),
            gps,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Only the JPEG branch offers binary round-trip editing.
    pub fn is_jpeg(&self) -> bool {
        matches!(self.extension.as_str(), "jpg" | "jpeg")
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn original(&self) -> &MetadataMap {
        &self.original
    }

    pub fn gps(&self) -> Option<GpsCoordinates> {
        self.gps
    }

    /// The edited view: every original key, with the edit overlay applied
    /// and unedited fields defaulting to their original value.
    pub fn edited(&self) -> MetadataMap {
        self.original
            .iter()
            .map(|(key, value)| {
                let value = self
                    .edits
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or(value);
                (key.to_string(), value.to_string())
            })
            .collect()
    }

    /// Overlays field edits. Keys that were never extracted are rejected so
    /// a stale client cannot invent fields.
    pub fn apply_edits(&mut self, edits: HashMap<String, String>) -> Result<(), AppError> {
        for key in edits.keys() {
            if !self.original.contains_key(key) {
                return Err(AppError::UnknownField(key.clone()));
            }
        }
        log::debug!("Applying {} field edit(s) to {}", edits.len(), self.filename);
        self.edits.extend(edits);
        Ok(())
    }
}
