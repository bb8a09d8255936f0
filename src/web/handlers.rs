//! Request handlers: form page, predictions, health and metrics

use std::time::Instant;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use serde::Serialize;
use tracing::info;

use super::error::WebError;
use super::page;
use super::AppState;
use crate::collector::PatientForm;
use crate::metrics::MetricsSnapshot;
use crate::presenter::PredictionView;

/// `GET /`
pub async fn index() -> Html<String> {
    Html(page::form_page(&PatientForm::default()))
}

/// `POST /predict`: urlencoded form in, result page out
pub async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<PatientForm>, FormRejection>,
) -> Result<Html<String>, WebError> {
    let Form(form) = form.map_err(|e| {
        state.metrics.record_rejected_input();
        WebError::Malformed(e.body_text())
    })?;
    let view = run_prediction(&state, &form)?;
    Ok(Html(page::result_page(&form, &view)))
}

/// `POST /api/predict`: JSON in, JSON out
pub async fn predict_json(
    State(state): State<AppState>,
    payload: Result<Json<PatientForm>, JsonRejection>,
) -> Result<Json<PredictionView>, WebError> {
    let Json(form) = payload.map_err(|e| {
        state.metrics.record_rejected_input();
        WebError::Malformed(e.body_text())
    })?;
    run_prediction(&state, &form).map(Json)
}

fn run_prediction(state: &AppState, form: &PatientForm) -> Result<PredictionView, WebError> {
    let start = Instant::now();

    let record = form
        .collect()
        .inspect_err(|_| state.metrics.record_rejected_input())?;

    let scored = state
        .predictor
        .score(record)
        .inspect_err(|_| state.metrics.record_failure())?;

    let elapsed = start.elapsed();
    let result = &scored.result;
    state.metrics.record_prediction(
        elapsed,
        result.probability,
        result.risk_tier,
        scored.backfilled.len(),
    );

    info!(
        request_id = %result.request_id,
        probability = result.probability,
        risk_tier = %result.risk_tier,
        processing_time_us = elapsed.as_micros() as u64,
        "Prediction served"
    );

    Ok(PredictionView::from(result))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub expected_features: usize,
    pub version: &'static str,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        expected_features: state.predictor.expected_features().len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
