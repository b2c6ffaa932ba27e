use crate::error::AppError;
use crate::metadata::MetadataMap;
use lopdf::{Document, Object};
use std::path::Path;

/// Reads the document information dictionary out of a PDF's trailer.
/// A PDF without an Info dictionary yields an empty mapping, not an error.
pub fn extract(path: &Path) -> Result<MetadataMap, AppError> {
    log::debug!("Extracting PDF information dictionary from {:?}", path);
    let document = Document::load(path)?;

    let info = match document.trailer.get(b"Info") {
        Ok(object) => object,
        Err(_) => {
            log::debug!("No Info entry in the trailer of {:?}", path);
            return Ok(MetadataMap::new());
        }
    };
    let Some(dictionary) = deref_dictionary(&document, info) else {
        return Ok(MetadataMap::new());
    };

    let mut metadata = MetadataMap::new();
    for (key, value) in dictionary.iter() {
        if let Some(text) = object_to_string(&document, value) {
            metadata.insert(String::from_utf8_lossy(key).to_string(), text);
        }
    }
    log::debug!("Extracted {} Info field(s) from {:?}", metadata.len(), path);
    Ok(metadata)
}

fn deref_dictionary<'a>(document: &'a Document, object: &'a Object) -> Option<&'a lopdf::Dictionary> {
    match object {
        Object::Reference(reference) => document.get_dictionary(*reference).ok(),
        Object::Dictionary(dictionary) => Some(dictionary),
        _ => None,
    }
}

fn object_to_string(document: &Document, object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).trim().to_string()),
        Object::Name(name) => Some(String::from_utf8_lossy(name).trim().to_string()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Reference(reference) => document
            .get_object(*reference)
            .ok()
            .and_then(|inner| object_to_string(document, inner)),
        _ => None,
    }
}
