//! Web form and JSON API.
//!
//! A single-page form served by the binary itself: pick a patient,
//! optionally bound the time range, pick or override a template, tick
//! focus areas, choose the output style, read the result, file feedback.
//! Pipeline failures travel inside the JSON payload so the form can
//! display them; only plumbing errors (database, bad input) become HTTP
//! error statuses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::models::{PromptTemplate, SummaryFeedback};
use crate::summary::render::format_timestamp;
use crate::summary::{
    generate_summary, ChatCompletionClient, CompletionResult, RenderedCounts, SummaryJob,
    SummaryStyle,
};

/// Shared state behind every handler. SQLite connections are not Sync,
/// so the connection sits behind an async mutex; queries are short.
pub struct AppState {
    pub conn: TokioMutex<Connection>,
    pub config: AppConfig,
}

/// Build the router with all routes attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_form_page))
        .route("/health", get(|| async { "ok" }))
        .route("/api/patients", get(list_patients))
        .route("/api/templates", get(list_templates))
        .route("/api/templates", post(create_template))
        .route("/api/templates/:name", put(update_template))
        .route("/api/summarize", post(summarize))
        .route("/api/feedback", post(file_feedback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the database and serve until interrupted.
pub async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    let conn = db::open_database(&config.db_path)?;
    let state = Arc::new(AppState {
        conn: TokioMutex::new(conn),
        config,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "chartbrief server listening");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct PatientRow {
    patient_id: String,
    first_recorded: String,
    last_recorded: String,
    record_count: i64,
    first_display: String,
    last_display: String,
}

#[derive(Deserialize)]
struct CreateTemplateRequest {
    name: String,
    content: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct UpdateTemplateRequest {
    content: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    patient_id: String,
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    template_name: String,
    custom_instruction: Option<String>,
    #[serde(default)]
    focus_areas: Vec<String>,
    #[serde(default)]
    style: SummaryStyle,
}

#[derive(Serialize)]
struct SummarizeResponse {
    patient_id: String,
    result: CompletionResult,
    used_fallback_template: bool,
    counts: RenderedCounts,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn serve_form_page() -> Html<&'static str> {
    Html(FORM_PAGE_HTML)
}

async fn list_patients(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.conn.lock().await;
    match db::list_patient_overviews(&conn) {
        Ok(overviews) => {
            let rows: Vec<PatientRow> = overviews
                .into_iter()
                .map(|o| PatientRow {
                    first_display: format_timestamp(&o.first_recorded),
                    last_display: format_timestamp(&o.last_recorded),
                    patient_id: o.patient_id,
                    first_recorded: o.first_recorded,
                    last_recorded: o.last_recorded,
                    record_count: o.record_count,
                })
                .collect();
            Json(rows).into_response()
        }
        Err(e) => db_error(e),
    }
}

async fn list_templates(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.conn.lock().await;
    match db::load_templates(&conn) {
        Ok(set) => {
            let templates: Vec<PromptTemplate> = set.iter().cloned().collect();
            Json(templates).into_response()
        }
        Err(e) => db_error(e),
    }
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> Response {
    if req.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "template name must not be empty");
    }
    let template = PromptTemplate {
        name: req.name,
        content: req.content,
        description: req.description,
    };
    let conn = state.conn.lock().await;
    match db::create_template(&conn, &template) {
        Ok(()) => (StatusCode::CREATED, Json(template)).into_response(),
        Err(e) => db_error(e),
    }
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Response {
    let conn = state.conn.lock().await;
    match db::update_template(&conn, &name, &req.content) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => db_error(e),
    }
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    if req.patient_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "patient_id must not be empty");
    }

    // Resolve records and templates up front, then release the lock
    // before the blocking network call.
    let (records, templates) = {
        let conn = state.conn.lock().await;
        let records = match db::fetch_patient_records(
            &conn,
            &req.patient_id,
            req.start.as_deref(),
            req.end.as_deref(),
        ) {
            Ok(r) => r,
            Err(e) => return db_error(e),
        };
        let templates = match db::load_templates(&conn) {
            Ok(t) => t,
            Err(e) => return db_error(e),
        };
        (records, templates)
    };

    // The blocking HTTP client is created and used off the async runtime.
    let config = state.config.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let backend =
            ChatCompletionClient::new(&config.api_base_url, config.api_key.clone(), &config.model)
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        let job = SummaryJob {
            patient_id: &req.patient_id,
            records: &records,
            template_name: &req.template_name,
            custom_instruction: req.custom_instruction.as_deref(),
            focus_areas: &req.focus_areas,
            style: req.style,
        };
        generate_summary(&job, &templates, &backend)
            .map(|outcome| (req.patient_id, outcome))
            // MissingDataError: empty-result condition, the form shows it
            .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))
    })
    .await;

    match outcome {
        Ok(Ok((patient_id, outcome))) => Json(SummarizeResponse {
            patient_id,
            result: outcome.result,
            used_fallback_template: outcome.used_fallback_template,
            counts: outcome.counts,
        })
        .into_response(),
        Ok(Err((status, message))) => error_response(status, &message),
        Err(join_err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("summary task failed: {join_err}"),
        ),
    }
}

async fn file_feedback(
    State(state): State<Arc<AppState>>,
    Json(fb): Json<SummaryFeedback>,
) -> Response {
    if !(1..=5).contains(&fb.rating) {
        return error_response(StatusCode::BAD_REQUEST, "rating must be between 1 and 5");
    }
    let conn = state.conn.lock().await;
    match db::insert_feedback(&conn, &fb) {
        Ok(id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response(),
        Err(e) => db_error(e),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn db_error(e: DatabaseError) -> Response {
    let status = match &e {
        DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        DatabaseError::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %e, "request failed");
    error_response(status, &e.to_string())
}

// ---------------------------------------------------------------------------
// Form page
// ---------------------------------------------------------------------------

const FORM_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Chartbrief</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #1c1917; }
  h1 { font-size: 1.4rem; }
  fieldset { border: 1px solid #d6d3d1; border-radius: 8px; margin-bottom: 1rem; }
  label { display: block; margin: 0.4rem 0 0.1rem; font-weight: 600; font-size: 0.9rem; }
  select, input[type=text], textarea { width: 100%; padding: 0.4rem; box-sizing: border-box; }
  textarea { min-height: 5rem; font-family: inherit; }
  .focus-areas label, .style label { display: inline-block; font-weight: 400; margin-right: 1rem; }
  button { background: #1c1917; color: #fff; border: 0; border-radius: 6px; padding: 0.6rem 1.2rem; cursor: pointer; }
  button:disabled { opacity: 0.5; }
  #result { white-space: pre-wrap; background: #fafaf9; border: 1px solid #e7e5e4; border-radius: 8px; padding: 1rem; margin-top: 1rem; }
  .warn { color: #b45309; font-size: 0.9rem; }
  .error { color: #b91c1c; }
</style>
</head>
<body>
<h1>Chartbrief — ER course summary</h1>

<fieldset>
  <legend>Patient</legend>
  <label for="patient">Patient</label>
  <select id="patient"></select>
  <label for="start">Start (YYYYMMDDHHMMSS, optional)</label>
  <input type="text" id="start" placeholder="20251115150000">
  <label for="end">End (YYYYMMDDHHMMSS, optional)</label>
  <input type="text" id="end">
</fieldset>

<fieldset>
  <legend>Prompt</legend>
  <label for="template">Template</label>
  <select id="template"></select>
  <label for="custom">Custom instruction (overrides the template)</label>
  <textarea id="custom" placeholder="Leave empty to use the selected template"></textarea>
  <div class="focus-areas">
    <label><input type="checkbox" value="vital-sign trend"> vital-sign trend</label>
    <label><input type="checkbox" value="abnormal lab values"> abnormal lab values</label>
    <label><input type="checkbox" value="consciousness changes"> consciousness changes</label>
    <label><input type="checkbox" value="medication response"> medication response</label>
  </div>
  <div class="style">
    <label><input type="radio" name="style" value="bulleted" checked> bulleted</label>
    <label><input type="radio" name="style" value="narrative"> narrative</label>
  </div>
</fieldset>

<button id="run">Generate summary</button>
<div id="status"></div>
<div id="result" hidden></div>

<fieldset id="feedback" hidden>
  <legend>Feedback</legend>
  <label for="rating">Rating (1–5)</label>
  <select id="rating"><option>5</option><option>4</option><option>3</option><option>2</option><option>1</option></select>
  <label for="comment">Comment (optional)</label>
  <textarea id="comment" placeholder="e.g. BP values were wrong, tone too stiff, missed the allergy history"></textarea>
  <button id="send-feedback">Send feedback</button>
</fieldset>

<script>
const $ = (id) => document.getElementById(id);
let lastSummary = "";

async function loadLists() {
  const patients = await fetch('/api/patients').then(r => r.json());
  $('patient').innerHTML = patients.map(p =>
    `<option value="${p.patient_id}">${p.patient_id} (${p.record_count} notes, ${p.first_display} – ${p.last_display})</option>`
  ).join('');
  const templates = await fetch('/api/templates').then(r => r.json());
  $('template').innerHTML = templates.map(t => `<option value="${t.name}">${t.name}</option>`).join('');
}

$('run').addEventListener('click', async () => {
  $('run').disabled = true;
  $('status').textContent = 'Generating…';
  $('result').hidden = true;
  $('feedback').hidden = true;
  const focus = [...document.querySelectorAll('.focus-areas input:checked')].map(c => c.value);
  const body = {
    patient_id: $('patient').value,
    start: $('start').value || null,
    end: $('end').value || null,
    template_name: $('template').value,
    custom_instruction: $('custom').value || null,
    focus_areas: focus,
    style: document.querySelector('input[name=style]:checked').value,
  };
  try {
    const resp = await fetch('/api/summarize', {
      method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(body),
    });
    const data = await resp.json();
    if (!resp.ok) {
      $('status').innerHTML = `<span class="error">${data.error}</span>`;
    } else if (data.result.status === 'failure') {
      $('status').innerHTML = `<span class="error">${data.result.diagnostic}</span>`;
    } else {
      const warn = data.used_fallback_template
        ? '<div class="warn">Selected template not found — default instruction used.</div>' : '';
      $('status').innerHTML = `${warn}Rendered ${data.counts.nursing} nursing / ${data.counts.vitals} vitals / ${data.counts.labs} labs records.`;
      lastSummary = data.result.summary;
      $('result').textContent = lastSummary;
      $('result').hidden = false;
      $('feedback').hidden = false;
    }
  } catch (e) {
    $('status').innerHTML = `<span class="error">${e}</span>`;
  } finally {
    $('run').disabled = false;
  }
});

$('send-feedback').addEventListener('click', async () => {
  const body = {
    patient_id: $('patient').value,
    template_name: $('template').value,
    rating: parseInt($('rating').value, 10),
    comment: $('comment').value || null,
    generated_summary: lastSummary,
  };
  const resp = await fetch('/api/feedback', {
    method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(body),
  });
  $('status').textContent = resp.ok ? 'Feedback saved, thank you.' : 'Could not save feedback.';
});

loadLists();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::NursingNote;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        let conn = open_memory_database().unwrap();
        Arc::new(AppState {
            conn: TokioMutex::new(conn),
            config: AppConfig {
                api_base_url: "http://127.0.0.1:1".into(),
                api_key: None,
                model: "test-model".into(),
                db_path: std::path::PathBuf::from(":memory:"),
            },
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn form_page_is_served_at_root() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Chartbrief"));
        assert!(body.contains("/api/summarize"));
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn patients_endpoint_lists_seeded_patient() {
        let state = test_state().await;
        {
            let conn = state.conn.lock().await;
            db::insert_nursing_note(
                &conn,
                "P001",
                &NursingNote {
                    recorded_at: "20251115150000".into(),
                    subject: Some("Triage".into()),
                    diagnosis: None,
                },
            )
            .unwrap();
        }
        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/patients")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("P001"));
        assert!(body.contains("2025-11-15 15:00"));
    }

    #[tokio::test]
    async fn summarize_without_records_reports_missing_data() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/summarize")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(
                        r#"{"patient_id":"P404","template_name":"x"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_string(response).await;
        assert!(body.contains("P404"));
    }

    #[tokio::test]
    async fn duplicate_template_create_conflicts() {
        let app = build_router(test_state().await);
        let request = || {
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/templates")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(
                    r#"{"name":"dup","content":"text"}"#,
                ))
                .unwrap()
        };
        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn feedback_rating_is_validated() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/feedback")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(
                        r#"{"patient_id":"P001","template_name":"t","rating":9,"comment":null,"generated_summary":"s"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
