use crate::error::AppError;
use crate::metadata::MetadataMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Core properties live in the docProps/core.xml part of the OOXML package.
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

#[derive(Debug, Default)]
struct CoreProperties {
    author: String,
    created: String,
    last_modified_by: String,
    modified: String,
    title: String,
}

/// Reads the fixed set of core document properties from an Office document.
/// Missing underlying values come back as empty strings, never as an error.
pub fn extract(path: &Path) -> Result<MetadataMap, AppError> {
    log::debug!("Extracting core properties from {:?}", path);
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let xml = match archive.by_name(CORE_PROPERTIES_PART) {
        Ok(mut part) => {
            let mut content = String::new();
            part.read_to_string(&mut content)?;
            content
        }
        Err(zip::result::ZipError::FileNotFound) => {
            log::debug!("No {} part in {:?}", CORE_PROPERTIES_PART, path);
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    let props = parse_core_properties(&xml)?;

    let mut metadata = MetadataMap::new();
    metadata.insert("author", props.author);
    metadata.insert("created", props.created);
    metadata.insert("last_modified_by", props.last_modified_by);
    metadata.insert("modified", props.modified);
    metadata.insert("title", props.title);
    Ok(metadata)
}

fn parse_core_properties(xml: &str) -> Result<CoreProperties, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut props = CoreProperties::default();
    // Name of the innermost open element; text is only assigned while a
    // leaf property element is open, so container elements like the
    // cp:coreProperties root never swallow their first child.
    let mut open_element: Option<Vec<u8>> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => open_element = Some(e.name().as_ref().to_vec()),
            Event::Text(text) => {
                let Some(name) = &open_element else {
                    continue;
                };
                let value = text.unescape()?.into_owned();
                match name.as_slice() {
                    b"dc:creator" => props.author = value,
                    b"dcterms:created" => props.created = value,
                    b"cp:lastModifiedBy" => props.last_modified_by = value,
                    b"dcterms:modified" => props.modified = value,
                    b"dc:title" => props.title = value,
                    _ => {}
                }
            }
            Event::End(_) => open_element = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(props)
}
