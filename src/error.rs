use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use exif::Error as ExifError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF error: {0}")]
    Exif(#[from] ExifError),

    #[error("EXIF rewrite error: {0}")]
    ExifRewrite(#[from] img_parts::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Document archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Document XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("Upload error: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),

    #[error("Unsupported file type: .{0}")]
    UnsupportedMedia(String),

    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    #[error("GPS data error: {0}")]
    Gps(String),

    #[error("No file has been uploaded")]
    NoSession,

    #[error("No metadata available to export")]
    NothingToExport,

    #[error("Only JPEG uploads can be re-encoded with edited tags")]
    NotJpeg,

    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Session state lock poisoned")]
    Lock,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Image(_) => StatusCode::BAD_REQUEST,
            AppError::Exif(_) => StatusCode::BAD_REQUEST,
            AppError::ExifRewrite(_) => StatusCode::BAD_REQUEST,
            AppError::Pdf(_) => StatusCode::BAD_REQUEST,
            AppError::Zip(_) => StatusCode::BAD_REQUEST,
            AppError::Xml(_) => StatusCode::BAD_REQUEST,
            AppError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::UnknownField(_) => StatusCode::BAD_REQUEST,
            AppError::Gps(_) => StatusCode::BAD_REQUEST,
            AppError::NoSession => StatusCode::NOT_FOUND,
            AppError::NothingToExport => StatusCode::NOT_FOUND,
            AppError::NotJpeg => StatusCode::BAD_REQUEST,
            AppError::EmptyUpload => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Lock => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
