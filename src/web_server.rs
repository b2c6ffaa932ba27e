use crate::config::AppConfig;
use crate::dispatch::FileKind;
use crate::error::AppError;
use crate::exif_writer;
use crate::export;
use crate::metadata::{GpsCoordinates, MetadataMap};
use crate::session::UploadSession;
use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::{web, App, HttpResponse, HttpServer};
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One live session at a time, matching the single-user upload model.
pub type SessionStore = Mutex<Option<UploadSession>>;

fn lock(store: &SessionStore) -> Result<MutexGuard<'_, Option<UploadSession>>, AppError> {
    store.lock().map_err(|_| AppError::Lock)
}

#[derive(Serialize, Debug)]
struct SessionView {
    filename: String,
    kind: FileKind,
    original: MetadataMap,
    edited: MetadataMap,
    gps: Option<GpsCoordinates>,
    reencode_available: bool,
    notice: Option<&'static str>,
}

fn view(session: &UploadSession) -> SessionView {
    let notice = if session.kind() == FileKind::Unsupported {
        Some("That file type is supported for upload, but metadata extraction isn't implemented yet.")
    } else if session.original().is_empty() {
        Some("No metadata found or unable to extract.")
    } else if session.gps().is_none() {
        Some("No GPS location found in metadata.")
    } else {
        None
    };

    SessionView {
        filename: session.filename().to_string(),
        kind: session.kind(),
        original: session.original().clone(),
        edited: session.edited(),
        gps: session.gps(),
        reencode_available: session.is_jpeg(),
        notice,
    }
}

async fn index() -> Result<NamedFile, AppError> {
    NamedFile::open_async("./static/index.html").await.map_err(|e| {
        log::error!("Error serving index.html: {}", e);
        AppError::Io(e)
    })
}

async fn upload(
    mut payload: Multipart,
    store: web::Data<SessionStore>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    // A new upload resets the pipeline to Idle even if extraction fails.
    *lock(&store)? = None;

    let mut uploaded: Option<(String, Vec<u8>)> = None;
    while let Some(mut field) = payload.try_next().await? {
        let Some(filename) = field.content_disposition().get_filename().map(str::to_owned)
        else {
            continue;
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > config.max_upload_bytes {
                return Err(AppError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        uploaded = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = uploaded.ok_or(AppError::EmptyUpload)?;
    if bytes.is_empty() {
        return Err(AppError::EmptyUpload);
    }
    log::info!("Received upload {} ({} bytes)", filename, bytes.len());

    let session = UploadSession::from_upload(&filename, bytes)?;
    let body = view(&session);
    *lock(&store)? = Some(session);
    Ok(HttpResponse::Ok().json(body))
}

async fn clear(store: web::Data<SessionStore>) -> Result<HttpResponse, AppError> {
    log::info!("Clearing the current session");
    *lock(&store)? = None;
    Ok(HttpResponse::NoContent().finish())
}

async fn get_metadata(store: web::Data<SessionStore>) -> Result<HttpResponse, AppError> {
    let guard = lock(&store)?;
    let session = guard.as_ref().ok_or(AppError::NoSession)?;
    Ok(HttpResponse::Ok().json(view(session)))
}

async fn put_edits(
    store: web::Data<SessionStore>,
    edits: web::Json<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let mut guard = lock(&store)?;
    let session = guard.as_mut().ok_or(AppError::NoSession)?;
    session.apply_edits(edits.into_inner())?;
    Ok(HttpResponse::Ok().json(view(session)))
}

fn csv_response(metadata: &MetadataMap, filename: &str) -> Result<HttpResponse, AppError> {
    if metadata.is_empty() {
        return Err(AppError::NothingToExport);
    }
    let bytes = export::metadata_to_csv(metadata)?;
    Ok(HttpResponse::Ok()
        .content_type(mime::TEXT_CSV)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}

async fn export_original(store: web::Data<SessionStore>) -> Result<HttpResponse, AppError> {
    let guard = lock(&store)?;
    let session = guard.as_ref().ok_or(AppError::NoSession)?;
    csv_response(session.original(), "original_metadata.csv")
}

async fn export_edited(store: web::Data<SessionStore>) -> Result<HttpResponse, AppError> {
    let guard = lock(&store)?;
    let session = guard.as_ref().ok_or(AppError::NoSession)?;
    csv_response(&session.edited(), "edited_metadata.csv")
}

/// JPEG-only download of the re-encoded image with the edited tags embedded.
/// Failures here are isolated: they never block the CSV exports.
async fn export_image(
    store: web::Data<SessionStore>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let guard = lock(&store)?;
    let session = guard.as_ref().ok_or(AppError::NoSession)?;
    if !session.is_jpeg() {
        return Err(AppError::NotJpeg);
    }

    let bytes = exif_writer::rewrite(session.bytes(), &session.edited(), config.jpeg_quality)
        .map_err(|e| {
            log::warn!("EXIF rewrite failed for {}: {}", session.filename(), e);
            e
        })?;

    Ok(HttpResponse::Ok()
        .content_type(mime::IMAGE_JPEG)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"edited_{}\"", session.filename()),
        ))
        .body(bytes))
}

fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/upload")
            .route(web::post().to(upload))
            .route(web::delete().to(clear)),
    )
    .service(web::resource("/api/metadata").route(web::get().to(get_metadata)))
    .service(web::resource("/api/edits").route(web::put().to(put_edits)))
    .service(web::resource("/api/export/original").route(web::get().to(export_original)))
    .service(web::resource("/api/export/edited").route(web::get().to(export_edited)))
    .service(web::resource("/api/export/image").route(web::get().to(export_image)));
}

pub async fn start_web_server(config: AppConfig) -> std::io::Result<()> {
    let port = config.web_port;
    let config_data = web::Data::new(config);
    let store = web::Data::new(SessionStore::default());

    log::info!("Starting web server on port: {}", port);
    log::debug!("Serving static files from ./static directory.");

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(store.clone())
            .service(actix_files::Files::new("/static", "./static"))
            .configure(api_routes)
            .default_service(web::to(index)) // Serve index.html for any unmatched route
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::io::Cursor;

    fn test_config() -> AppConfig {
        AppConfig {
            web_port: 0,
            log_level: "info".to_string(),
            max_upload_bytes: 1024 * 1024,
            jpeg_quality: 90,
        }
    }

    fn plain_jpeg() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([1, 2, 3]),
        ));
        let mut bytes = Vec::new();
        img.write_to(
            &mut Cursor::new(&mut bytes),
            image::ImageOutputFormat::Jpeg(90),
        )
        .unwrap();
        bytes
    }

    macro_rules! api_app {
        ($session:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .app_data(web::Data::new(SessionStore::new($session)))
                    .configure(api_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn routes_without_a_session_return_not_found() {
        let app = api_app!(None);

        for path in [
            "/api/metadata",
            "/api/export/original",
            "/api/export/edited",
            "/api/export/image",
        ] {
            let request = test::TestRequest::get().uri(path).to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        }

        let request = test::TestRequest::put()
            .uri("/api/edits")
            .set_json(HashMap::<String, String>::new())
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn image_export_for_a_non_jpeg_session_is_a_bad_request() {
        let session = UploadSession::from_upload("shot.png", plain_jpeg()).unwrap();
        let app = api_app!(Some(session));

        let request = test::TestRequest::get()
            .uri("/api/export/image")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn image_export_for_a_jpeg_session_serves_the_reencoded_file() {
        let session = UploadSession::from_upload("photo.jpg", plain_jpeg()).unwrap();
        let app = api_app!(Some(session));

        let request = test::TestRequest::get()
            .uri("/api/export/image")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("edited_photo.jpg"), "{}", disposition);

        let body = test::read_body(response).await;
        assert!(image::load_from_memory(&body).is_ok());
    }

    #[actix_web::test]
    async fn csv_export_with_no_extracted_metadata_is_not_found() {
        // A fresh synthetic JPEG carries no EXIF, so there is nothing to export.
        let session = UploadSession::from_upload("photo.jpg", plain_jpeg()).unwrap();
        let app = api_app!(Some(session));

        let request = test::TestRequest::get()
            .uri("/api/export/original")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
