use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::airlines::types::AirlineId;
use crate::error::MembershipError;

/// Failure of an HTTP call, rendered as `{ "error": kind, "message": text }`
#[derive(Debug)]
pub enum ApiError {
    MissingCaller,
    InvalidBody(String),
    NoPendingProposal(AirlineId),
    Membership(MembershipError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        Self::Membership(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCaller => StatusCode::UNAUTHORIZED,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NoPendingProposal(_) => StatusCode::NOT_FOUND,
            ApiError::Membership(err) => match err {
                MembershipError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                MembershipError::ProposerNotFunded(_) => StatusCode::FORBIDDEN,
                MembershipError::ServiceSuspended => StatusCode::SERVICE_UNAVAILABLE,
                MembershipError::AlreadyRegistered(_) => StatusCode::CONFLICT,
                MembershipError::UnknownAirline(_) => StatusCode::NOT_FOUND,
                MembershipError::NotRegistered(_) => StatusCode::NOT_FOUND,
                MembershipError::InsufficientFunding { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                MembershipError::BalanceOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
                MembershipError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                MembershipError::ConfigError(_)
                | MembershipError::JournalError(_)
                | MembershipError::SnapshotError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingCaller => "missing_caller",
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::NoPendingProposal(_) => "no_pending_proposal",
            ApiError::Membership(err) => err.kind(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingCaller => "Request has no x-caller header".to_string(),
            ApiError::InvalidBody(reason) => reason.clone(),
            ApiError::NoPendingProposal(candidate) => {
                format!("No pending registration for {}", candidate)
            }
            ApiError::Membership(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
