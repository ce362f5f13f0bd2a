//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use dtaxi_core::{area::AreaRegistry, record::Actor};
use dtaxi_report::{Error as ReportError, RenderTarget, Renderer};
use dtaxi_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, api_router};

struct FakePdf;

impl Renderer for FakePdf {
  fn render(&self, html: &str, target: RenderTarget) -> dtaxi_report::Result<Vec<u8>> {
    Ok(format!("{}:{}", target.extension(), html.len()).into_bytes())
  }
}

struct Broken;

impl Renderer for Broken {
  fn render(&self, _html: &str, _target: RenderTarget) -> dtaxi_report::Result<Vec<u8>> {
    Err(ReportError::renderer("no display"))
  }
}

async fn state() -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(Arc::new(store), AreaRegistry::standard())
}

fn app(state: ApiState<SqliteStore>) -> Router {
  api_router(state).layer(Extension(Actor::new("Marta Coordenadora", "marta@dtaxi.example")))
}

async fn raw(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, bytes.to_vec())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let (status, bytes) = raw(app, method, uri, body).await;
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn complaint(app: &Router, text: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/areas/contato/records",
    Some(json!({
      "category": "Reclamação",
      "nome": "Paulo Henrique",
      "telefone": "(11) 91234-5678",
      "mensagem": text,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["id"].as_str().unwrap().to_owned()
}

// ─── Areas ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_standard_areas() {
  let app = app(state().await);
  let (status, body) = send(&app, "GET", "/areas", None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body.as_array().unwrap().iter().map(|a| a["name"].as_str().unwrap()).collect();
  assert_eq!(names, ["contato", "documentos", "elogios", "pesquisas"]);
}

#[tokio::test]
async fn unknown_area_is_404() {
  let app = app(state().await);
  let (status, body) = send(&app, "GET", "/areas/frota/records", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("frota"));
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_submission_is_listed_first_and_counted() {
  let app = app(state().await);
  complaint(&app, "primeira").await;
  let (_, before) = send(&app, "GET", "/areas/contato/counts", None).await;

  let id = complaint(&app, "motorista não apareceu").await;

  let (_, after) = send(&app, "GET", "/areas/contato/counts", None).await;
  assert_eq!(after["all"], before["all"].as_u64().unwrap() + 1);
  assert_eq!(
    after["by_category"]["Reclamação"],
    before["by_category"]["Reclamação"].as_u64().unwrap() + 1
  );
  assert_eq!(after["by_category"]["Elogio"], 0);

  let (status, page) = send(&app, "GET", "/areas/contato/records", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["items"][0]["id"], id.as_str());
  assert_eq!(page["items"][0]["status"], "pendente");
}

#[tokio::test]
async fn create_rejects_missing_required_field() {
  let app = app(state().await);
  let (status, _) = send(
    &app,
    "POST",
    "/areas/contato/records",
    Some(json!({ "category": "Sugestão" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    "POST",
    "/areas/contato/records",
    Some(json!({ "category": "Spam", "mensagem": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_rejects_reserved_keys_and_keeps_area_listable() {
  let app = app(state().await);
  complaint(&app, "antes").await;
  let (status, body) = send(
    &app,
    "POST",
    "/areas/contato/records",
    Some(json!({ "category": "Reclamação", "mensagem": "x", "history": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("history"));

  let (status, page) = send(&app, "GET", "/areas/contato/records", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["total_items"], 1);
  let (status, _) = send(&app, "GET", "/areas/contato/counts", None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn filters_and_paginates() {
  let app = app(state().await);
  for i in 0..3 {
    complaint(&app, &format!("atraso {i}")).await;
  }
  complaint(&app, "carro sujo").await;

  let (_, page) = send(&app, "GET", "/areas/contato/records?text=ATRASO&page_size=2", None).await;
  assert_eq!(page["total_items"], 3);
  assert_eq!(page["total_pages"], 2);
  assert_eq!(page["items"].as_array().unwrap().len(), 2);

  let (_, page) = send(&app, "GET", "/areas/contato/records?text=atraso&page_size=2&page=2", None).await;
  assert_eq!(page["items"].as_array().unwrap().len(), 1);

  let (status, page) =
    send(&app, "GET", "/areas/contato/records?text=atraso&page_size=2&page=9", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(page["items"].as_array().unwrap().is_empty());
  assert_eq!(page["total_pages"], 2);

  let (status, _) = send(&app, "GET", "/areas/contato/records?status=aberto", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_with_note_then_archive_again() {
  let app = app(state().await);
  let id = complaint(&app, "x").await;
  let uri = format!("/areas/contato/records/{id}/archive");

  let (status, outcome) = send(&app, "POST", &uri, Some(json!({ "note": "resolvido por telefone" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["to"]["collection"], "reclamacoes-arquivadas");
  let entry = &outcome["record"]["history"][0];
  assert_eq!(entry["actor"], "Marta Coordenadora");
  assert_eq!(entry["action"], "arquivado");
  assert_eq!(entry["note"], "resolvido por telefone");

  let (status, _) = send(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, located) = send(&app, "GET", &format!("/areas/contato/records/{id}"), None).await;
  assert_eq!(located["location"]["archived"], true);
  assert_eq!(located["record"]["history"].as_array().unwrap().len(), 1);

  let (_, archived) = send(&app, "GET", "/areas/contato/records?archived=true", None).await;
  assert_eq!(archived["total_items"], 1);
}

#[tokio::test]
async fn resolve_twice_conflicts() {
  let app = app(state().await);
  let id = complaint(&app, "x").await;
  let uri = format!("/areas/contato/records/{id}/resolve");
  let (status, outcome) = send(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["record"]["status"], "respondido");

  let (status, _) = send(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn migrate_requires_category() {
  let app = app(state().await);
  let id = complaint(&app, "elogio mal classificado").await;
  let uri = format!("/areas/contato/records/{id}/migrate");

  let (status, _) = send(&app, "POST", &uri, Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, outcome) = send(&app, "POST", &uri, Some(json!({ "category": "Elogio" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["to"]["collection"], "elogios");
  assert_eq!(outcome["record"]["category"], "Elogio");
}

#[tokio::test]
async fn bulk_archive_stops_at_first_failure() {
  let app = app(state().await);
  let a = complaint(&app, "a").await;
  let b = complaint(&app, "b").await;
  let missing = uuid::Uuid::new_v4().to_string();

  let (status, report) = send(
    &app,
    "POST",
    "/areas/contato/bulk/archive",
    Some(json!({ "ids": [&a, &missing, &b] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let results: Vec<_> = report["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|i| i["result"].as_str().unwrap())
    .collect();
  assert_eq!(results, ["done", "failed", "skipped"]);

  let (_, live) = send(&app, "GET", "/areas/contato/records", None).await;
  assert_eq!(live["total_items"], 1);
  assert_eq!(live["items"][0]["id"], b.as_str());

  let (status, _) = send(&app, "POST", "/areas/contato/bulk/archive", Some(json!({ "ids": [] }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_unarchive_restores_previous_status() {
  let app = app(state().await);
  let a = complaint(&app, "a").await;
  let b = complaint(&app, "b").await;
  let c = complaint(&app, "c").await;
  let missing = uuid::Uuid::new_v4().to_string();

  let (status, _) = send(&app, "POST", &format!("/areas/contato/records/{a}/resolve"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (_, report) = send(
    &app,
    "POST",
    "/areas/contato/bulk/archive",
    Some(json!({ "ids": [&a, &b, &c] })),
  )
  .await;
  assert_eq!(report["items"].as_array().unwrap().len(), 3);
  let (_, archived) = send(&app, "GET", "/areas/contato/records?archived=true", None).await;
  assert_eq!(archived["total_items"], 3);

  let (status, report) = send(
    &app,
    "POST",
    "/areas/contato/bulk/unarchive",
    Some(json!({ "ids": [&a, &b, &missing, &c], "note": "reaberto" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let results: Vec<_> = report["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|i| i["result"].as_str().unwrap())
    .collect();
  assert_eq!(results, ["done", "done", "failed", "skipped"]);
  assert_eq!(report["items"][2]["id"], missing.as_str());
  assert_eq!(report["items"][3]["id"], c.as_str());

  let (_, located) = send(&app, "GET", &format!("/areas/contato/records/{a}"), None).await;
  assert_eq!(located["location"]["archived"], false);
  assert_eq!(located["location"]["collection"], "reclamacoes");
  assert_eq!(located["record"]["status"], "respondido");
  let actions: Vec<_> = located["record"]["history"]
    .as_array()
    .unwrap()
    .iter()
    .map(|h| h["action"].as_str().unwrap())
    .collect();
  assert_eq!(actions, ["marcado como respondido", "arquivado", "desarquivado"]);
  assert_eq!(located["record"]["history"][2]["note"], "reaberto");

  let (_, located) = send(&app, "GET", &format!("/areas/contato/records/{b}"), None).await;
  assert_eq!(located["location"]["archived"], false);
  assert_eq!(located["record"]["status"], "pendente");

  let (_, archived) = send(&app, "GET", "/areas/contato/records?archived=true", None).await;
  assert_eq!(archived["total_items"], 1);
  assert_eq!(archived["items"][0]["id"], c.as_str());

  let (status, outcome) =
    send(&app, "POST", &format!("/areas/contato/records/{c}/unarchive"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(outcome["to"]["archived"], false);
  assert_eq!(outcome["record"]["status"], "pendente");

  let (_, archived) = send(&app, "GET", "/areas/contato/records?archived=true", None).await;
  assert_eq!(archived["total_items"], 0);
  let (_, live) = send(&app, "GET", "/areas/contato/records", None).await;
  assert_eq!(live["total_items"], 3);

  let (status, _) =
    send(&app, "POST", &format!("/areas/contato/records/{c}/unarchive"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn links_for_record() {
  let app = app(state().await);
  let id = complaint(&app, "x").await;
  let (status, links) = send(&app, "GET", &format!("/areas/contato/records/{id}/links"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(links["whatsapp"].as_str().unwrap().starts_with("https://wa.me/11912345678?text="));
  assert!(links["email"].is_null());

  let (status, _) = send(
    &app,
    "GET",
    &format!("/areas/contato/records/{id}/links?channel=email"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Exports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn csv_export_masks_on_request() {
  let app = app(state().await);
  complaint(&app, "atraso; muito grave").await;

  let (status, bytes) = raw(&app, "GET", "/areas/contato/export.csv?hide_sensitive=true", None).await;
  assert_eq!(status, StatusCode::OK);
  let csv = String::from_utf8(bytes).unwrap();
  let mut lines = csv.lines();
  assert_eq!(
    lines.next(),
    Some("Data;Tipo;Status;Nome;E-mail;Telefone;Assunto;Mensagem")
  );
  let row = lines.next().unwrap();
  assert!(row.contains("P***********ue"), "{row}");
  assert!(!row.contains("Paulo"));
  assert!(row.ends_with("\"atraso; muito grave\""));
}

#[tokio::test]
async fn pdf_export_needs_renderer() {
  let base = state().await;
  let (status, _) = send(&app(base.clone()), "GET", "/areas/elogios/export.pdf", None).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

  let (status, bytes) = raw(
    &app(base.clone().with_renderer(Arc::new(FakePdf))),
    "GET",
    "/areas/elogios/export.pdf",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(String::from_utf8(bytes).unwrap().starts_with("pdf:"));

  let (status, body) = send(
    &app(base.with_renderer(Arc::new(Broken))),
    "GET",
    "/areas/elogios/export.pdf",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(body["error"].as_str().unwrap().contains("no display"));
}

// ─── Files ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_then_download() {
  let app = app(state().await);
  let req = Request::builder()
    .method("PUT")
    .uri("/uploads/turma-3/presenca.csv")
    .header(header::CONTENT_TYPE, "text/csv")
    .body(Body::from("nome;cpf\n"))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let stored: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(stored["key"], "uploads/turma-3/presenca.csv");
  assert_eq!(stored["size"], 9);

  let (status, body) = raw(&app, "GET", "/files/uploads/turma-3/presenca.csv", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, b"nome;cpf\n");

  let (status, _) = raw(&app, "GET", "/files/uploads/turma-3/outro.csv", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
