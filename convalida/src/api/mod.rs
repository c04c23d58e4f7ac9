//! REST API surface for the conversion and transfer engine.
//!
//! Route modules per concern, composed into one router over a shared
//! `ApiState`. Wire field names follow the public Spanish contract
//! (`sistemaOrigen`, `valorOriginal`, ...).

pub mod conversion_routes;
pub mod equivalence_routes;
pub mod transfer_routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::conversion::ConversionEngine;
use crate::equivalence::EquivalenceService;
use crate::error::{ConversionError, EquivalenceError, TransferError};
use crate::transfer::TransferService;

/// Shared state for every route.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<ConversionEngine>,
    pub equivalences: Arc<EquivalenceService>,
    pub transfers: Arc<TransferService>,
}

/// Compose the full API router.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/salud", get(health))
        .merge(conversion_routes::router())
        .merge(transfer_routes::router())
        .merge(equivalence_routes::router())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Wire shape for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub(crate) fn conversion_error(err: ConversionError) -> ApiError {
    let status = match &err {
        ConversionError::InvalidRange { .. }
        | ConversionError::SystemMismatch { .. }
        | ConversionError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
        ConversionError::NoTable { .. } | ConversionError::NoTableVersion { .. } => {
            StatusCode::NOT_FOUND
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub(crate) fn equivalence_error(err: EquivalenceError) -> ApiError {
    let status = match &err {
        EquivalenceError::SelfEquivalence(_) | EquivalenceError::InvalidPercentage(_) => {
            StatusCode::BAD_REQUEST
        }
        EquivalenceError::SubjectNotFound(_) | EquivalenceError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EquivalenceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub(crate) fn transfer_error(err: TransferError) -> ApiError {
    match err {
        TransferError::InProgress { .. } => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        ),
        TransferError::InstitutionNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        ),
        TransferError::Conversion(e) => conversion_error(e),
        TransferError::Equivalence(e) => equivalence_error(e),
        TransferError::Store(_) | TransferError::InvalidTransition { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        ),
    }
}
