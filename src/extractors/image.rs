use crate::error::AppError;
use crate::gps;
use crate::metadata::{Extraction, MetadataMap};
use exif::{Context, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads every EXIF tag of a JPEG/PNG file, stringified through the tag's
/// display formatting, and separately attempts GPS decimal-degree recovery.
pub fn extract(path: &Path) -> Result<Extraction, AppError> {
    log::debug!("Extracting EXIF metadata from {:?}", path);
    let file = File::open(path)?;
    let mut buf_reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            log::debug!("No EXIF segment in {:?}", path);
            return Ok(Extraction::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut metadata = MetadataMap::new();
    for field in exif.fields() {
        metadata.insert(field_key(field), field_value(field));
    }
    log::debug!("Extracted {} EXIF field(s) from {:?}", metadata.len(), path);

    let gps = gps::convert(
        exif.get_field(Tag::GPSLatitude, In::PRIMARY).map(|f| &f.value),
        exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY).map(|f| &f.value),
        exif.get_field(Tag::GPSLongitude, In::PRIMARY).map(|f| &f.value),
        exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY).map(|f| &f.value),
    )?;
    if let Some(coords) = gps {
        log::debug!(
            "Recovered GPS position {:.4}, {:.4} from {:?}",
            coords.latitude,
            coords.longitude,
            path
        );
    }

    Ok(Extraction { metadata, gps })
}

/// "<group> <TagName>" keys, e.g. "Image Make", "Exif DateTimeOriginal",
/// "GPS GPSLatitude". Thumbnail IFD tags are prefixed "Thumbnail".
fn field_key(field: &Field) -> String {
    let group = if field.ifd_num == In::THUMBNAIL {
        "Thumbnail"
    } else {
        match field.tag.0 {
            Context::Tiff => "Image",
            Context::Exif => "Exif",
            Context::Gps => "GPS",
            Context::Interop => "Interop",
            _ => "Image",
        }
    };
    format!("{} {}", group, field.tag)
}

/// ASCII values are taken verbatim (display formatting wraps them in
/// quotes); everything else goes through the tag's display formatting.
fn field_value(field: &Field) -> String {
    match &field.value {
        Value::Ascii(strings) => strings
            .iter()
            .map(|s| String::from_utf8_lossy(s))
            .collect::<Vec<_>>()
            .join(", ")
            .trim_end_matches('\0')
            .trim()
            .to_string(),
        _ => field.display_value().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Value;
    use std::io::Cursor;

    #[test]
    fn image_without_exif_yields_empty_metadata() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([10, 20, 30]),
        ));
        let mut bytes = Vec::new();
        img.write_to(
            &mut Cursor::new(&mut bytes),
            image::ImageOutputFormat::Jpeg(90),
        )
        .unwrap();

        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        std::io::Write::write_all(&mut file, &bytes).unwrap();

        let extraction = extract(file.path()).unwrap();
        assert!(extraction.metadata.is_empty());
        assert!(extraction.gps.is_none());
    }

    #[test]
    fn keys_carry_the_ifd_group_prefix() {
        let make = Field {
            tag: Tag::Make,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"Canon".to_vec()]),
        };
        assert_eq!(field_key(&make), "Image Make");

        let original = Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"2024:01:01 00:00:00".to_vec()]),
        };
        assert_eq!(field_key(&original), "Exif DateTimeOriginal");

        let lat = Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![]),
        };
        assert_eq!(field_key(&lat), "GPS GPSLatitude");

        let thumb = Field {
            tag: Tag::Compression,
            ifd_num: In::THUMBNAIL,
            value: Value::Short(vec![6]),
        };
        assert_eq!(field_key(&thumb), "Thumbnail Compression");
    }

    #[test]
    fn ascii_values_are_stringified_without_quotes() {
        let make = Field {
            tag: Tag::Make,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"Canon\0".to_vec()]),
        };
        assert_eq!(field_value(&make), "Canon");
    }
}
