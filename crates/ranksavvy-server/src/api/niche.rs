use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::{Stream, StreamExt};
use ranksavvy_agents::AnalysisProgress;
use ranksavvy_core::{AnalysisOptions, AnalysisResult, LocalListing};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::middleware::RequestId;

use super::{required, ApiError, AppState};

const QUERY_AND_LOCATION_REQUIRED: &str = "Query and location are required";

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    query: Option<String>,
    location: Option<String>,
    #[serde(default)]
    options: AnalysisOptions,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeResponse {
    success: bool,
    data: AnalysisResult,
}

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteRequest {
    query: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AutocompleteResponse {
    success: bool,
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LocalCompetitorsRequest {
    query: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LocalCompetitorsResponse {
    success: bool,
    competitors: Vec<LocalListing>,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let query = required(req.query.as_deref(), QUERY_AND_LOCATION_REQUIRED)?;
    let location = required(req.location.as_deref(), QUERY_AND_LOCATION_REQUIRED)?;
    tracing::info!(request_id = %req_id.0, query, location, "analysis requested");

    let data = state.lead.analyze_niche(query, location, req.options).await;
    Ok(Json(AnalyzeResponse {
        success: true,
        data,
    }))
}

/// Server-sent events, one per pipeline step, ending with `completed` or
/// `error`. The analysis keeps running if the client disconnects.
pub(super) async fn analyze_stream(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let query = required(req.query.as_deref(), QUERY_AND_LOCATION_REQUIRED)?.to_owned();
    let location = required(req.location.as_deref(), QUERY_AND_LOCATION_REQUIRED)?.to_owned();
    tracing::info!(request_id = %req_id.0, query = %query, location = %location, "streaming analysis requested");

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let lead = Arc::clone(&state.lead);
    let options = req.options;
    tokio::spawn(async move {
        lead.analyze_niche_with_progress(&query, &location, options, Some(&tx))
            .await;
    });

    let events = UnboundedReceiverStream::new(rx).map(|progress| Ok(progress_event(&progress)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn progress_event(progress: &AnalysisProgress) -> Event {
    match serde_json::to_string(progress) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode progress event");
            Event::default().data(r#"{"status":"error","error":"failed to encode progress event"}"#)
        }
    }
}

pub(super) async fn autocomplete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(req): Json<AutocompleteRequest>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
    let query = required(req.query.as_deref(), "Query is required")?;
    let location = req.location.as_deref().map(str::trim).filter(|l| !l.is_empty());

    let suggestions = state
        .lead
        .scraper()
        .autocomplete(query, location)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %req_id.0, query, error = %e, "autocomplete failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(AutocompleteResponse {
        success: true,
        suggestions,
    }))
}

pub(super) async fn local_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(req): Json<LocalCompetitorsRequest>,
) -> Result<Json<LocalCompetitorsResponse>, ApiError> {
    let query = required(req.query.as_deref(), QUERY_AND_LOCATION_REQUIRED)?;
    let location = required(req.location.as_deref(), QUERY_AND_LOCATION_REQUIRED)?;

    let competitors = state
        .lead
        .scraper()
        .local_competitors(query, location)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %req_id.0, query, location, error = %e, "local competitor lookup failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(LocalCompetitorsResponse {
        success: true,
        competitors,
    }))
}
