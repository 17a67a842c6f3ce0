//! HTTP server for the CultURIze API.
//!
//! # API Endpoints
//!
//! | Method | Path            | Description                              |
//! |--------|-----------------|------------------------------------------|
//! | GET    | `/health`       | Health check                             |
//! | GET    | `/api/logs`     | SSE stream of step logs                  |
//! | GET    | `/api/report`   | SSE stream of live report events         |
//! | POST   | `/api/convert`  | CSV → Apache / Nginx configuration       |
//! | POST   | `/api/validate` | CSV → per-row diagnostics                |

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, LOG_BROADCASTER, REPORT_BROADCASTER};
use super::types::{error_response, ConvertResponse, ValidateResponse};
use crate::config::Settings;
use crate::error::{ParseError, PipelineError, ServerError, ServerResult};
use crate::parser::decode_bytes;
use crate::pipeline::{check_rows, convert_text, parse_for_validation, LiveReport, ValidateOptions};
use crate::publish::is_valid_subdir;
use crate::render::Target;
use crate::report::{render_row, Action, HtmlMode};

type AppState = Arc<Settings>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Parse(ParseError::Io(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Pipeline(PipelineError::Parse(_) | PipelineError::InvalidInput(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log_error(self.to_string());
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the application router.
pub fn router(settings: Settings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/logs", get(sse_logs))
        .route("/api/report", get(sse_report))
        .route("/api/convert", post(convert_csv))
        .route("/api/validate", post(validate_csv))
        .layer(cors)
        .with_state(Arc::new(settings))
}

/// Start the HTTP server
pub async fn start_server(port: u16, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(settings);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 CultURIze server running on http://localhost:{}", port);
    println!("   POST /api/convert  - CSV to redirect configuration");
    println!("   POST /api/validate - CSV validation report");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /api/report   - SSE live report stream");
    println!("   GET  /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "culturize",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /api/convert",
            "validate": "POST /api/validate",
            "logs": "GET /api/logs (SSE)",
            "report": "GET /api/report (SSE)"
        }
    }))
}

fn sse_stream<T>(
    rx: tokio::sync::broadcast::Receiver<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Clone + Send + 'static,
{
    // Lagged receivers skip missed messages
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let item = result.ok()?;
        let json = serde_json::to_string(&item).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_stream(LOG_BROADCASTER.subscribe())
}

async fn sse_report() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_stream(REPORT_BROADCASTER.subscribe())
}

/// A multipart upload: the CSV bytes plus plain text fields.
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
    fields: HashMap<String, String>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut file: Option<(Option<String>, Vec<u8>)> = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                fields.insert(name, text);
            }
        }

        let (file_name, bytes) =
            file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
        log_info(format!(
            "Received {} ({} bytes)",
            file_name.as_deref().unwrap_or("unknown"),
            bytes.len()
        ));
        Ok(Self { file_name, bytes, fields })
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    fn flag(&self, name: &str, default: bool) -> ServerResult<bool> {
        match self.field(name) {
            None => Ok(default),
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ServerError::BadRequest(format!("Invalid value for {}: {}", name, v))),
            },
        }
    }
}

async fn convert_csv(
    State(settings): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<ConvertResponse>> {
    let upload = Upload::read(multipart).await?;

    let target = match upload.field("target") {
        Some(t) => t.parse::<Target>().map_err(ServerError::BadRequest)?,
        None => Target::Apache,
    };
    let subdir = upload.field("subdir").unwrap_or("").trim_matches('/').to_string();
    if !subdir.is_empty() && !is_valid_subdir(&subdir) {
        return Err(ServerError::BadRequest(format!("\"{}\" is not a valid path", subdir)));
    }

    let decoded = decode_bytes(&upload.bytes);
    let result = convert_text(&decoded.text, target, &subdir, &settings.redirect)?;

    Ok(Json(ConvertResponse::new(Uuid::new_v4().to_string(), target, result)))
}

async fn validate_csv(
    State(settings): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<ValidateResponse>> {
    let upload = Upload::read(multipart).await?;
    let check_urls = upload.flag("checkUrls", true)?;
    let mode = if upload.flag("verbatimHtml", false)? {
        HtmlMode::Verbatim
    } else {
        HtmlMode::Escaped
    };
    if let Some(name) = &upload.file_name {
        log_info(format!("Validating {}", name));
    }

    let decoded = decode_bytes(&upload.bytes);
    let mut rows = parse_for_validation(&decoded.text, &settings.redirect)?;

    let options = ValidateOptions::from_probe(&settings.probe, check_urls);
    let mut live = LiveReport::start(Action::Validate, rows.len(), mode);
    let job_id = live.job_id().to_string();
    check_rows(&mut rows, &options, |row| {
        live.push(row);
    })
    .await;
    let tally = live.finish();

    let html = rows.iter().map(|row| render_row(row, mode)).collect();
    Ok(Json(ValidateResponse::new(job_id, check_urls, tally, rows, html)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::logs::ReportEvent;
    use tokio::sync::broadcast::error::TryRecvError;

    async fn spawn(settings: Settings) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(settings)).await.unwrap();
        });
        addr
    }

    fn csv_part(text: &str) -> reqwest::multipart::Part {
        reqwest::multipart::Part::bytes(text.as_bytes().to_vec()).file_name("sheet.csv")
    }

    const SHEET: &str = "PID,document type,URL,enabled\n\
        a,data,http://test.test/a,1\n\
        b,data,not-a-url,1\n";

    #[tokio::test]
    async fn test_health() {
        let addr = spawn(Settings::default()).await;
        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_convert_endpoint() {
        let addr = spawn(Settings::default()).await;
        let form = reqwest::multipart::Form::new()
            .part("file", csv_part(SHEET))
            .text("target", "nginx")
            .text("subdir", "sub");

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/convert", addr))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["config"], "rewrite /sub/data/a$ http://test.test/a redirect ;\n");
        assert_eq!(body["numLinesAccepted"], 1);
        assert_eq!(body["numLinesRejected"], 1);
    }

    #[tokio::test]
    async fn test_convert_rejects_bad_input() {
        let addr = spawn(Settings::default()).await;
        let client = reqwest::Client::new();

        let no_file = reqwest::multipart::Form::new().text("target", "apache");
        let response = client
            .post(format!("http://{}/api/convert", addr))
            .multipart(no_file)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let empty = reqwest::multipart::Form::new().part("file", csv_part(""));
        let response = client
            .post(format!("http://{}/api/convert", addr))
            .multipart(empty)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("The file is empty"));
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let addr = spawn(Settings::default()).await;
        let mut events = REPORT_BROADCASTER.subscribe();
        let form = reqwest::multipart::Form::new()
            .part("file", csv_part(SHEET))
            .text("checkUrls", "false");

        let body: Value = reqwest::Client::new()
            .post(format!("http://{}/api/validate", addr))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["accepted"], 1);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["html"].as_array().unwrap().len(), 2);
        assert_eq!(body["rows"][1]["errors"][0], "E04");

        let job_id = body["jobId"].as_str().unwrap().to_string();
        let mut saw_finish = false;
        loop {
            match events.try_recv() {
                Ok(ReportEvent::Finished { job_id: id, accepted, rejected }) if id == job_id => {
                    assert_eq!((accepted, rejected), (1, 1));
                    saw_finish = true;
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(saw_finish);
    }
}
