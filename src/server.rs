/// HTTP server: the upload page plus a JSON API over the sweep pipeline
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, Error, HttpResponse, HttpServer, ResponseError};
use log::info;

use crate::api::{ConvertRequest, ErrorBody, FileList, UploadRequest, UploadResponse};
use crate::config::SweeperConfig;
use crate::error::SweepError;
use crate::state::AppState;
use crate::sweep::{Rejection, SweepOptions};

const INDEX_HTML: &str = include_str!("../assets/index.html");

impl ResponseError for SweepError {
    fn status_code(&self) -> StatusCode {
        match self {
            SweepError::UnsupportedExtension(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            SweepError::FileNotFound(_) => StatusCode::NOT_FOUND,
            SweepError::Csv(_)
            | SweepError::Spreadsheet(_)
            | SweepError::Malformed(_)
            | SweepError::EmptyFile
            | SweepError::UnknownColumn(_)
            | SweepError::Table(_)
            | SweepError::NoColumns
            | SweepError::InvalidUpload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SweepError::Workbook(_) | SweepError::Io(_) | SweepError::Chart(_) | SweepError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Upload page
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Data Sweeper is running"
    }))
}

async fn list_files(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(FileList { files: state.list() })
}

/// Accept a batch of files. Files that fail to decode or parse are listed
/// under `rejected`; the others join the session.
async fn upload_files(
    state: web::Data<AppState>,
    body: web::Json<UploadRequest>,
) -> Result<HttpResponse, Error> {
    let mut rejected = Vec::new();
    let mut files = Vec::new();
    for payload in body.into_inner().files {
        let name = payload.name.clone();
        match payload.decode() {
            Ok(file) => files.push(file),
            Err(e) => rejected.push(Rejection {
                name,
                error: e.to_string(),
            }),
        }
    }

    let sweeper = state.sweeper.clone();
    let outcome = web::block(move || sweeper.accept(files)).await?;
    rejected.extend(outcome.rejected);

    let accepted = outcome
        .accepted
        .into_iter()
        .map(|(file, info)| state.insert(file, info))
        .collect();

    Ok(HttpResponse::Ok().json(UploadResponse { accepted, rejected }))
}

async fn delete_file(state: web::Data<AppState>, path: web::Path<u64>) -> Result<HttpResponse, Error> {
    state.remove(path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Run the pipeline and return the report for one file
async fn render_file(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    options: web::Json<SweepOptions>,
) -> Result<HttpResponse, Error> {
    let file = state.get(path.into_inner())?;
    let sweeper = state.sweeper.clone();
    let options = options.into_inner();

    let swept = web::block(move || sweeper.sweep(&file, &options)).await??;
    Ok(HttpResponse::Ok().json(swept.report))
}

/// Run the pipeline and send the result as a download
async fn convert_file(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    request: web::Json<ConvertRequest>,
) -> Result<HttpResponse, Error> {
    let file = state.get(path.into_inner())?;
    let sweeper = state.sweeper.clone();
    let ConvertRequest { options, format } = request.into_inner();

    let buffer = web::block(move || sweeper.convert(&file, &options, format)).await??;
    Ok(HttpResponse::Ok()
        .content_type(buffer.mime_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(buffer.file_name)],
        })
        .body(buffer.bytes))
}

/// Routes shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .service(
            web::resource("/api/files")
                .route(web::get().to(list_files))
                .route(web::post().to(upload_files)),
        )
        .route("/api/files/{id}", web::delete().to(delete_file))
        .route("/api/files/{id}/render", web::post().to(render_file))
        .route("/api/files/{id}/convert", web::post().to(convert_file));
}

/// Request body limit: base64 grows the payload by a third.
fn json_limit(config: &SweeperConfig) -> usize {
    config.max_upload_bytes.saturating_add(config.max_upload_bytes / 3).saturating_add(64 * 1024)
}

/// Start the HTTP server
pub async fn run_server(config: SweeperConfig) -> std::io::Result<()> {
    let host = config.host.clone();
    let port = config.port;
    let limit = json_limit(&config);
    let state = web::Data::new(AppState::new(&config));

    info!("Data Sweeper listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(limit))
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::test as actix_test;
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use serde_json::{json, Value};

    const SALES: &str = "region,units,price\nnorth,10,2.5\nsouth,,4.0\nnorth,10,2.5\n";

    fn upload_body(files: &[(&str, &str)]) -> Value {
        json!({
            "files": files
                .iter()
                .map(|(name, data)| json!({"name": name, "data": BASE64_STANDARD.encode(data)}))
                .collect::<Vec<_>>()
        })
    }

    macro_rules! init_app {
        () => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::default()))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_and_index() {
        let app = init_app!();

        let req = actix_test::TestRequest::get().uri("/health").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");

        let req = actix_test::TestRequest::get().uri("/").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = actix_test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("Data Sweeper"));
    }

    #[actix_web::test]
    async fn test_upload_batch() {
        let app = init_app!();

        let req = actix_test::TestRequest::post()
            .uri("/api/files")
            .set_json(upload_body(&[("sales.csv", SALES), ("notes.txt", "hello")]))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(body["accepted"][0]["name"], "sales.csv");
        assert_eq!(body["accepted"][0]["format"], "csv");
        assert_eq!(body["rejected"][0]["name"], "notes.txt");
        assert_eq!(body["rejected"][0]["error"], "Unsupported file type: .txt");

        let req = actix_test::TestRequest::get().uri("/api/files").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["files"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_render_and_convert() {
        let app = init_app!();

        let req = actix_test::TestRequest::post()
            .uri("/api/files")
            .set_json(upload_body(&[("sales.csv", SALES)]))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let id = body["accepted"][0]["id"].as_u64().unwrap();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/files/{}/render", id))
            .set_json(json!({"remove_duplicates": true, "show_chart": true}))
            .to_request();
        let report: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["row_count"], 2);
        assert_eq!(report["notices"][0], "Duplicates removed");
        assert_eq!(report["chart"]["status"], "rendered");

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/files/{}/convert", id))
            .set_json(json!({"columns": ["region"], "format": "csv"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"sales.csv\""
        );
        let body = actix_test::read_body(resp).await;
        assert_eq!(&body[..], b"region\nnorth\nsouth\nnorth\n");
    }

    #[actix_web::test]
    async fn test_errors() {
        let app = init_app!();

        let req = actix_test::TestRequest::post()
            .uri("/api/files/99/render")
            .set_json(json!({}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "File 99 is not part of this session");

        let req = actix_test::TestRequest::post()
            .uri("/api/files")
            .set_json(upload_body(&[("sales.csv", SALES)]))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let id = body["accepted"][0]["id"].as_u64().unwrap();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/files/{}/convert", id))
            .set_json(json!({"columns": [], "format": "excel"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = actix_test::TestRequest::delete()
            .uri(&format!("/api/files/{}", id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::delete()
            .uri(&format!("/api/files/{}", id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_deleted_files_leave_the_session() {
        let app = init_app!();

        let req = actix_test::TestRequest::post()
            .uri("/api/files")
            .set_json(upload_body(&[("a.csv", "x\n1\n"), ("b.csv", "y\n2\n")]))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let first = body["accepted"][0]["id"].as_u64().unwrap();

        let req = actix_test::TestRequest::delete()
            .uri(&format!("/api/files/{}", first))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::get().uri("/api/files").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["b.csv"]);
    }

    #[test]
    fn test_page_manages_session_and_clean_toggle() {
        // Cards are rebuilt from the session list and can be removed
        assert!(INDEX_HTML.contains("fetch(\"/api/files\")"));
        assert!(INDEX_HTML.contains("method: \"DELETE\""));
        // Turning the clean toggle off clears both cleaning flags
        assert!(INDEX_HTML.contains("update({ remove_duplicates: false, fill_missing: false })"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SweepError::UnsupportedExtension(".txt".to_string()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(SweepError::EmptyFile.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            SweepError::Chart("backend".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_limit_covers_base64() {
        let config = SweeperConfig {
            max_upload_bytes: 3 * 1024 * 1024,
            ..SweeperConfig::default()
        };
        assert!(json_limit(&config) > 4 * 1024 * 1024);
    }
}
