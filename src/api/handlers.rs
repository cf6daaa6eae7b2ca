use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use super::{caller_from_headers, ApiError, AppState};
use crate::airlines::types::{Airline, AirlineId, Amount, ProposalTally, RegistrationOutcome};

#[derive(Debug, Deserialize)]
pub struct OperatingStatusRequest {
    pub operational: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAirlineRequest {
    pub candidate: String,
}

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub amount: Amount,
}

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let shared = state.shared().lock().await;
    Json(serde_json::json!({
        "status": "healthy",
        "service": "airline-membership",
        "timestamp": chrono::Utc::now(),
        "operational": shared.network.is_operational(),
        "registered_airlines": shared.network.count_of_registered_airlines(),
        "journal_entries": shared.network.journal().next_sequence(),
    }))
}

pub async fn is_operational(State(state): State<AppState>) -> Json<serde_json::Value> {
    let shared = state.shared().lock().await;
    Json(serde_json::json!({ "operational": shared.network.is_operational() }))
}

pub async fn set_operating_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<OperatingStatusRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let Json(request) = payload?;
    let mut shared = state.shared().lock().await;

    shared
        .network
        .set_operating_status(request.operational, &caller)?;
    shared.persist();

    Ok(Json(serde_json::json!({ "operational": shared.network.is_operational() })))
}

pub async fn register_airline(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterAirlineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), ApiError> {
    let proposer = caller_from_headers(&headers)?;
    let Json(request) = payload?;
    let candidate = AirlineId::parse(&request.candidate)?;
    let mut shared = state.shared().lock().await;

    let outcome = shared.network.register_airline(&candidate, &proposer)?;
    shared.persist();

    let status = if outcome.is_finalized() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(outcome)))
}

pub async fn fund(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FundRequest>, JsonRejection>,
) -> Result<Json<Airline>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let Json(request) = payload?;
    let mut shared = state.shared().lock().await;

    shared.network.fund(&caller, request.amount, &caller)?;
    shared.persist();

    info!("Funding of {} accepted from {}", request.amount, caller);
    Ok(Json(shared.network.get_airline(&caller)?))
}

pub async fn count_of_registered_airlines(
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let shared = state.shared().lock().await;
    Json(serde_json::json!({ "count": shared.network.count_of_registered_airlines() }))
}

pub async fn get_airline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Airline>, ApiError> {
    let airline = AirlineId::parse(&id)?;
    let shared = state.shared().lock().await;
    Ok(Json(shared.network.get_airline(&airline)?))
}

pub async fn is_airline_registered(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let airline = AirlineId::parse(&id)?;
    let shared = state.shared().lock().await;
    Ok(Json(serde_json::json!({
        "airline": airline,
        "registered": shared.network.is_airline_registered(&airline),
    })))
}

pub async fn get_proposal(
    State(state): State<AppState>,
    Path(candidate): Path<String>,
) -> Result<Json<ProposalTally>, ApiError> {
    let candidate = AirlineId::parse(&candidate)?;
    let shared = state.shared().lock().await;
    shared
        .network
        .proposal(&candidate)
        .map(Json)
        .ok_or(ApiError::NoPendingProposal(candidate))
}

pub async fn journal(State(state): State<AppState>) -> Json<serde_json::Value> {
    let shared = state.shared().lock().await;
    let journal = shared.network.journal();
    Json(serde_json::json!({
        "head_hash": journal.head_hash(),
        "first_sequence": journal.first_sequence(),
        "entries": journal.entries(),
    }))
}
