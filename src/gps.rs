use crate::error::AppError;
use crate::metadata::GpsCoordinates;
use exif::Value;

/// Converts the four raw EXIF GPS sub-fields into signed decimal degrees.
///
/// Recovery is all-or-nothing: if any of the four fields is missing the
/// result is `Ok(None)`, never a partial pair. A hemisphere reference that
/// is not one of the two expected letters for its axis is reported as an
/// error instead of being silently treated as a sign flip.
pub fn convert(
    latitude: Option<&Value>,
    latitude_ref: Option<&Value>,
    longitude: Option<&Value>,
    longitude_ref: Option<&Value>,
) -> Result<Option<GpsCoordinates>, AppError> {
    let (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) =
        (latitude, latitude_ref, longitude, longitude_ref)
    else {
        return Ok(None);
    };

    let latitude = signed(dms_magnitude(lat)?, &reference_letter(lat_ref)?, "N", "S")?;
    let longitude = signed(dms_magnitude(lon)?, &reference_letter(lon_ref)?, "E", "W")?;
    Ok(Some(GpsCoordinates {
        latitude,
        longitude,
    }))
}

/// degrees + minutes/60 + seconds/3600, each component taken from its
/// exact rational as num/den in floating arithmetic.
fn dms_magnitude(value: &Value) -> Result<f64, AppError> {
    let Value::Rational(parts) = value else {
        return Err(AppError::Gps(format!(
            "expected a rational DMS triple, got {:?}",
            value
        )));
    };
    if parts.len() < 3 {
        return Err(AppError::Gps(format!(
            "DMS triple has only {} component(s)",
            parts.len()
        )));
    }

    let degrees = parts[0].to_f64();
    let minutes = parts[1].to_f64();
    let seconds = parts[2].to_f64();
    Ok(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn reference_letter(value: &Value) -> Result<String, AppError> {
    let Value::Ascii(strings) = value else {
        return Err(AppError::Gps(format!(
            "expected an ASCII hemisphere reference, got {:?}",
            value
        )));
    };
    let Some(first) = strings.first() else {
        return Err(AppError::Gps("empty hemisphere reference".into()));
    };
    Ok(String::from_utf8_lossy(first)
        .trim_end_matches('\0')
        .trim()
        .to_string())
}

fn signed(
    magnitude: f64,
    reference: &str,
    positive: &str,
    negative: &str,
) -> Result<f64, AppError> {
    if reference == positive {
        Ok(magnitude)
    } else if reference == negative {
        Ok(-magnitude)
    } else {
        Err(AppError::Gps(format!(
            "unrecognized hemisphere reference {:?} (expected {} or {})",
            reference, positive, negative
        )))
    }
}
