use crate::error::AppError;
use crate::metadata::MetadataMap;

/// Serializes a metadata mapping to a two-column CSV byte stream, header
/// `Key,Value`, one row per entry, insertion order preserved.
pub fn metadata_to_csv(metadata: &MetadataMap) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Key", "Value"])?;
    for (key, value) in metadata.iter() {
        writer.write_record([key, value])?;
    }
    writer.flush()?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> MetadataMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn header_is_exactly_key_value() {
        let bytes = metadata_to_csv(&mapping(&[("Image Make", "Canon")])).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Key,Value\n"));
        assert_eq!(text, "Key,Value\nImage Make,Canon\n");
    }

    #[test]
    fn round_trips_ordered_pairs() {
        let input = mapping(&[
            ("Image Make", "Canon"),
            ("Image Model", "EOS R5"),
            ("Exif UserComment", "low light, f/1.8"),
            ("GPS GPSLatitude", "[40, 26, 0]"),
        ]);
        let bytes = metadata_to_csv(&input).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["Key", "Value"])
        );
        let decoded: MetadataMap = reader
            .records()
            .map(|record| {
                let record = record.unwrap();
                (record[0].to_string(), record[1].to_string())
            })
            .collect();
        assert_eq!(decoded, input);
    }

    #[test]
    fn empty_mapping_exports_just_the_header() {
        let bytes = metadata_to_csv(&MetadataMap::new()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Key,Value\n");
    }
}
