//! # HTTP API Module
//!
//! ## Purpose
//! REST interface over the search pipeline and the record store, built on
//! actix-web. All endpoints return JSON.
//!
//! ## Endpoints
//! - `GET /api/search` — run the pipeline, return records + stats + analytics
//! - `POST /api/import` — run the pipeline and persist the result
//! - `GET /api/records` — list stored records with optional filters
//! - `GET /api/dashboard-stats` — analytics over the stored records
//! - `GET /api/history` — recent searches
//! - `GET /health` — component health
//!
//! A failed acquisition is not an HTTP error: searches resolve 200 with an
//! empty record list and an error marker in the statistics.

use crate::analytics::compute_dashboard;
use crate::errors::PrecatorioError;
use crate::pipeline::FilterSpec;
use crate::{AppState, CaseStatus, Nature, SearchParams};
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::RwLock;
use uuid::Uuid;

impl actix_web::ResponseError for PrecatorioError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self.category() {
            "api" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "category": self.category(),
        }))
    }
}

/// Query parameters shared by the search, import and records endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub court: Option<String>,
    pub quantity: Option<usize>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub nature: Option<String>,
    pub budget_year: Option<i32>,
    pub status: Option<String>,
}

impl SearchQuery {
    fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            min_value: self.value_min,
            max_value: self.value_max,
            nature: self.nature.as_deref().and_then(Nature::parse_filter),
            budget_year: self.budget_year,
            status: self.status.as_deref().and_then(CaseStatus::parse_filter),
        }
    }

    fn search_params(&self) -> SearchParams {
        SearchParams {
            court: self
                .court
                .clone()
                .unwrap_or_else(|| "TJ-SP".to_string()),
            quantity: self.quantity.unwrap_or(SearchParams::DEFAULT_QUANTITY),
            filter: self.filter_spec(),
        }
    }
}

/// One entry in the in-memory search history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub court: String,
    pub quantity: usize,
    pub returned: usize,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bounded in-memory ring of recent searches, newest first.
pub struct SearchHistory {
    capacity: usize,
    entries: RwLock<VecDeque<HistoryEntry>>,
}

impl SearchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    pub fn push(&self, entry: HistoryEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push_front(entry);
            entries.truncate(self.capacity);
        }
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Register all routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::scope("/api")
                .route("/search", web::get().to(search))
                .route("/import", web::post().to(import))
                .route("/records", web::get().to(list_records))
                .route("/dashboard-stats", web::get().to(dashboard_stats))
                .route("/history", web::get().to(history)),
        );
}

async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let params = query.search_params();
    tracing::info!(
        "Search request: court={} quantity={}",
        params.court,
        params.clamped_quantity()
    );

    let outcome = state.pipeline.search(&params).await;

    state.history.push(HistoryEntry {
        id: Uuid::new_v4(),
        at: Utc::now(),
        court: params.court.clone(),
        quantity: params.clamped_quantity(),
        returned: outcome.stats.returned,
        source: outcome.stats.source.clone(),
        error: outcome.stats.error.clone(),
    });

    Ok(HttpResponse::Ok().json(json!({
        "records": outcome.records,
        "stats": outcome.stats,
        "analytics": compute_dashboard(&outcome.records),
    })))
}

async fn import(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse, PrecatorioError> {
    let params = query.search_params();
    let outcome = state.pipeline.search(&params).await;

    let imported = if outcome.records.is_empty() {
        0
    } else {
        state
            .storage
            .replace_court_records(&params.court, &outcome.records)?
    };

    tracing::info!("Imported {} records for {}", imported, params.court);

    Ok(HttpResponse::Ok().json(json!({
        "imported": imported,
        "stats": outcome.stats,
    })))
}

async fn list_records(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse, PrecatorioError> {
    let records = state.storage.list_records(query.court.as_deref())?;
    let records = crate::pipeline::apply_filters(records, &query.filter_spec());

    Ok(HttpResponse::Ok().json(json!({
        "count": records.len(),
        "records": records,
    })))
}

async fn dashboard_stats(
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, PrecatorioError> {
    let records = state.storage.list_records(None)?;
    Ok(HttpResponse::Ok().json(compute_dashboard(&records)))
}

async fn history(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "searches": state.history.list() })))
}

async fn health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.storage.health_check() {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "status": "healthy",
            "storage": "ok",
            "recordCount": state.storage.record_count(),
            "datajudConfigured": !state.config.acquisition.datajud.api_key.is_empty(),
            "syntheticFallback": state.config.acquisition.enable_synthetic_fallback,
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "storage": e.to_string(),
            })))
        }
    }
}
