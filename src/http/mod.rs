//! Stage A's HTTP surface: `POST /submit`, `GET /download`,
//! `GET /download_json`, `GET /indicators/{indicator_type}`, grounded
//! on the original `act.scio.api` FastAPI service.
//!
//! Routes are registered with `configure()` so `scio serve` can mount
//! them alongside whatever else actix-web needs.

use std::sync::{Arc, OnceLock};

use actix_web::{web, HttpResponse};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::{BlobStore, IndexClient, Queue};
use crate::Error;

/// Shared state every handler closes over: the stage-A collaborators
/// plus the optional index client `GET /indicators` and `GET
/// /download*` read from.
pub struct AppState {
    pub blob_store: Arc<dyn BlobStore + Send + Sync>,
    pub queue: Arc<dyn Queue + Send + Sync>,
    pub index: Option<Arc<dyn IndexClient + Send + Sync>>,
    pub max_jobs: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/submit", web::post().to(submit_handler))
        .route("/download", web::get().to(download_handler))
        .route("/download_json", web::get().to(download_json_handler))
        .route("/indicators/{indicator_type}", web::get().to(indicators_handler));
}

fn hexdigest_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Fa-f]{64}$").unwrap())
}

fn indicator_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(ipv4|ipv6|uri|email|fqdn|md5|sha1|sha256)$").unwrap())
}

fn last_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[yMwdhms]?$").unwrap())
}

async fn submit_handler(
    state: web::Data<AppState>,
    body: web::Json<crate::pipeline::SubmitRequest>,
) -> HttpResponse {
    match crate::pipeline::submit(
        body.into_inner(),
        state.blob_store.as_ref(),
        state.queue.as_ref(),
        state.max_jobs,
    )
    .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(Error::QueueSaturated(msg)) => {
            HttpResponse::ServiceUnavailable().json(error_body(&msg))
        }
        Err(Error::InvalidSubmission(msg)) => HttpResponse::BadRequest().json(error_body(&msg)),
        Err(err) => HttpResponse::InternalServerError().json(error_body(&err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(msg: &str) -> ErrorBody {
    ErrorBody { error: msg.to_string() }
}

/// Look up a document's filename and content type by hexdigest, mirroring
/// `document_lookup()` in the original: a best-effort read against the
/// index that returns blanks (not an error) on a miss.
async fn document_lookup(
    state: &AppState,
    hexdigest: &str,
) -> (String, Option<String>) {
    let Some(index) = &state.index else {
        return (hexdigest.to_string(), None);
    };
    match index.get(hexdigest).await {
        Ok(Some(record)) => (record.filename, record.content_type),
        _ => (hexdigest.to_string(), None),
    }
}

async fn download_handler(state: web::Data<AppState>, query: web::Query<IdQuery>) -> HttpResponse {
    let id = query.id.to_lowercase();
    if !hexdigest_re().is_match(&id) {
        return HttpResponse::BadRequest().json(error_body("id must be a 64-character hex digest"));
    }

    let bytes = match state.blob_store.get(&id).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            return HttpResponse::Ok()
                .content_type("text/plain")
                .body("File not found")
        }
        Err(err) => return HttpResponse::InternalServerError().json(error_body(&err.to_string())),
    };

    let (filename, content_type) = document_lookup(&state, &id).await;

    HttpResponse::Ok()
        .content_type(content_type.unwrap_or_else(|| "application/octet-stream".to_string()))
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes)
}

#[derive(Debug, Serialize)]
struct DownloadJsonResponse {
    error: Option<String>,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
}

async fn download_json_handler(
    state: web::Data<AppState>,
    query: web::Query<IdQuery>,
) -> HttpResponse {
    let id = query.id.to_lowercase();
    if !hexdigest_re().is_match(&id) {
        return HttpResponse::BadRequest().json(error_body("id must be a 64-character hex digest"));
    }

    match state.blob_store.get(&id).await {
        Ok(Some(bytes)) => HttpResponse::Ok().json(DownloadJsonResponse {
            error: None,
            bytes: bytes.len(),
            content: Some(base64::engine::general_purpose::STANDARD.encode(&bytes)),
            encoding: Some("base64".to_string()),
        }),
        Ok(None) => HttpResponse::Ok().json(DownloadJsonResponse {
            error: Some("File not found".to_string()),
            bytes: 0,
            content: None,
            encoding: None,
        }),
        Err(err) => HttpResponse::InternalServerError().json(error_body(&err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct IndicatorsQuery {
    #[serde(default = "default_last")]
    last: String,
}

fn default_last() -> String {
    "90d".to_string()
}

/// `now - last`, or the epoch-millis instant `last` names when it is
/// pure digits, per the original's "<NUM><UNIT> or <EPOC>" contract.
fn parse_since(last: &str) -> Option<DateTime<Utc>> {
    if last.chars().all(|c| c.is_ascii_digit()) {
        let millis: i64 = last.parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }

    let unit = last.chars().last()?;
    let amount: i64 = last[..last.len() - 1].parse().ok()?;
    let duration = match unit {
        'y' => chrono::Duration::days(365 * amount),
        'M' => chrono::Duration::days(30 * amount),
        'w' => chrono::Duration::weeks(amount),
        'd' => chrono::Duration::days(amount),
        'h' => chrono::Duration::hours(amount),
        'm' => chrono::Duration::minutes(amount),
        's' => chrono::Duration::seconds(amount),
        _ => return None,
    };
    Some(Utc::now() - duration)
}

async fn indicators_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<IndicatorsQuery>,
) -> HttpResponse {
    let indicator_type = path.into_inner();
    if !indicator_type_re().is_match(&indicator_type) {
        return HttpResponse::BadRequest().json(error_body(
            "indicator_type must be one of ipv4, ipv6, uri, email, fqdn, md5, sha1, sha256",
        ));
    }
    if !last_re().is_match(&query.last) {
        return HttpResponse::BadRequest()
            .json(error_body("last must match <NUM><y|M|w|d|h|m|s> or a pure epoch"));
    }

    let Some(index) = &state.index else {
        return HttpResponse::PreconditionFailed()
            .json(error_body("index is not configured"));
    };

    let since = parse_since(&query.last);
    match index.query_indicators(&indicator_type, since).await {
        Ok(values) => HttpResponse::Ok()
            .content_type("text/plain")
            .body(values.join("\n")),
        Err(err) => HttpResponse::InternalServerError().json(error_body(&err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FsBlobStore, MemoryQueue};
    use actix_web::{test, App};

    fn test_state(index: Option<Arc<dyn IndexClient + Send + Sync>>) -> web::Data<AppState> {
        let dir = tempfile::tempdir().unwrap();
        web::Data::new(AppState {
            blob_store: Arc::new(FsBlobStore::new(dir.path().to_path_buf())),
            queue: Arc::new(MemoryQueue::new()),
            index,
            max_jobs: 100,
        })
    }

    #[actix_web::test]
    async fn test_submit_then_download_round_trips() {
        let state = test_state(None);
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let body = serde_json::json!({
            "content": base64::engine::general_purpose::STANDARD.encode("hello world"),
            "filename": "report.txt",
        });
        let req = test::TestRequest::post()
            .uri("/submit")
            .set_json(&body)
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let hexdigest = resp["hexdigest"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/download?id={hexdigest}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"hello world");
    }

    #[actix_web::test]
    async fn test_download_rejects_malformed_id() {
        let state = test_state(None);
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/download?id=not-hex").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_indicators_rejects_unknown_type() {
        let state = test_state(None);
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/indicators/not-a-type").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_indicators_without_index_is_precondition_failed() {
        let state = test_state(None);
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/indicators/ipv4").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 412);
    }

    #[test]
    fn test_parse_since_handles_duration_suffix() {
        let since = parse_since("7d").unwrap();
        assert!(since < Utc::now());
    }

    #[test]
    fn test_parse_since_handles_epoch_millis() {
        let since = parse_since("0").unwrap();
        assert_eq!(since.timestamp(), 0);
    }

    #[test]
    fn test_parse_since_rejects_garbage_unit() {
        assert!(parse_since("7x").is_none());
    }
}
