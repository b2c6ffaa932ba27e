use crate::error::AppError;
use crate::metadata::MetadataMap;
use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;

/// The only edited fields that round-trip into the EXIF binary structure.
/// Everything else a user edits is cosmetic and lives in the CSV export only.
const TAG_REWRITE_TABLE: [(&str, Tag); 6] = [
    ("Image Artist", Tag::Artist),
    ("Image Make", Tag::Make),
    ("Image Model", Tag::Model),
    ("Image Software", Tag::Software),
    ("Exif DateTimeOriginal", Tag::DateTimeOriginal),
    ("Exif UserComment", Tag::UserComment),
];

fn rewrite_target(key: &str) -> Option<Tag> {
    TAG_REWRITE_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tag)| *tag)
}

/// Rebuilds the EXIF blob of `original` with the eligible edited fields
/// written into their IFD slots, then re-encodes the image as JPEG with the
/// new blob embedded. A JPEG with no EXIF and no eligible edits is simply
/// re-encoded without a blob.
pub fn rewrite(
    original: &[u8],
    edited: &MetadataMap,
    jpeg_quality: u8,
) -> Result<Vec<u8>, AppError> {
    let blob = build_exif_blob(original, edited)?;
    reencode_jpeg(original, blob, jpeg_quality)
}

/// Loads the existing EXIF structure, replaces the slots named by the
/// tag-rewrite table (empty edited values are skipped, the existing tag
/// survives), and serializes a fresh TIFF-format blob. Returns `None` when
/// there are no fields at all to serialize.
pub fn build_exif_blob(
    original: &[u8],
    edited: &MetadataMap,
) -> Result<Option<Vec<u8>>, AppError> {
    let mut cursor = Cursor::new(original);
    let existing = Reader::new().read_from_container(&mut cursor).ok();

    let updates: Vec<(Tag, &str)> = edited
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, value)| rewrite_target(key).map(|tag| (tag, value)))
        .collect();

    let mut fields: Vec<Field> = Vec::new();
    if let Some(exif) = &existing {
        // Thumbnail-IFD tags point at thumbnail image data the writer is
        // not given, so only the primary-IFD fields survive the rebuild.
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let replaced = updates.iter().any(|(tag, _)| *tag == field.tag);
            if !replaced {
                fields.push(Field {
                    tag: field.tag,
                    ifd_num: field.ifd_num,
                    value: field.value.clone(),
                });
            }
        }
    }

    for (tag, value) in &updates {
        log::debug!("Rewriting EXIF tag {} with edited value", tag);
        fields.push(Field {
            tag: *tag,
            ifd_num: In::PRIMARY,
            value: encode_tag_value(*tag, value),
        });
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut blob = Cursor::new(Vec::new());
    writer.write(&mut blob, false)?;
    Ok(Some(blob.into_inner()))
}

/// UserComment is an undefined-type slot, so it takes the raw UTF-8 bytes
/// with a NUL terminator; the ASCII tags get their terminator from the
/// TIFF serialization itself.
fn encode_tag_value(tag: Tag, value: &str) -> Value {
    if tag == Tag::UserComment {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        Value::Undefined(bytes, 0)
    } else {
        Value::Ascii(vec![value.as_bytes().to_vec()])
    }
}

/// Decodes the original image, re-encodes it as JPEG at the configured
/// quality, and embeds `exif_blob` (when present) as the APP1 segment.
pub fn reencode_jpeg(
    original: &[u8],
    exif_blob: Option<Vec<u8>>,
    jpeg_quality: u8,
) -> Result<Vec<u8>, AppError> {
    let decoded = image::load_from_memory(original)?;

    let mut encoded = Vec::new();
    decoded.write_to(
        &mut Cursor::new(&mut encoded),
        image::ImageOutputFormat::Jpeg(jpeg_quality),
    )?;

    let mut jpeg = Jpeg::from_bytes(encoded.into())?;
    jpeg.set_exif(exif_blob.map(Bytes::from));
    Ok(jpeg.encoder().bytes().to_vec())
}
