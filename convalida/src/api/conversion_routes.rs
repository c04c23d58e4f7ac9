//! Conversion REST routes.
//!
//! - `POST /conversiones/convertir` - single grade conversion
//! - `POST /conversiones/multiple` - order-preserving batch, per-item errors
//! - `GET  /conversiones/tabla/:origen/:destino` - current table dump
//! - `GET  /conversiones/reglas` - systems and published tables overview

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::api::{bad_request, conversion_error, ApiError, ApiState};
use crate::models::{GradeSystem, NativeValue};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/conversiones/convertir", post(convert_single))
        .route("/conversiones/multiple", post(convert_batch))
        .route("/conversiones/tabla/:origen/:destino", get(table_dump))
        .route("/conversiones/reglas", get(rules_overview))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConvertRequest {
    #[serde(rename = "sistemaOrigen")]
    sistema_origen: String,
    #[serde(rename = "sistemaDestino")]
    sistema_destino: String,
    #[serde(rename = "valorOriginal")]
    valor_original: serde_json::Value,
    /// Optional pinned table version; the current version by default.
    version: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    #[serde(rename = "valorConvertido")]
    valor_convertido: serde_json::Value,
    clasificacion: String,
    descripcion: String,
    metadatos: ConvertMetadata,
}

#[derive(Debug, Serialize)]
struct ConvertMetadata {
    metodologia: String,
    #[serde(rename = "valorNormalizado")]
    valor_normalizado: f64,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(rename = "sistemaOrigen")]
    sistema_origen: String,
    #[serde(rename = "sistemaDestino")]
    sistema_destino: String,
    valores: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct BatchItem {
    exito: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resultado: Option<ConvertResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchResponse {
    resultados: Vec<BatchItem>,
}

#[derive(Debug, Serialize)]
struct TableRow {
    origen: String,
    destino: String,
    descripcion: String,
}

#[derive(Debug, Serialize)]
struct TableResponse {
    version: u32,
    tabla: Vec<TableRow>,
}

// ============================================================================
// Handlers
// ============================================================================

fn parse_system(code: &str) -> Result<GradeSystem, ApiError> {
    GradeSystem::from_code(code).ok_or_else(|| bad_request(format!("unknown grade system: {code}")))
}

async fn convert_single(
    State(state): State<ApiState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let origin = parse_system(&request.sistema_origen)?;
    let destination = parse_system(&request.sistema_destino)?;
    let value = NativeValue::from_wire(origin, &request.valor_original).map_err(conversion_error)?;
    let outcome = state
        .engine
        .convert_versioned(origin, destination, &value, request.version)
        .map_err(conversion_error)?;
    Ok(Json(ConvertResponse {
        valor_convertido: outcome.native_destination.to_wire(),
        clasificacion: outcome.classification,
        descripcion: outcome.description,
        metadatos: ConvertMetadata {
            metodologia: outcome.methodology,
            valor_normalizado: outcome.normalized.get(),
        },
    }))
}

async fn convert_batch(
    State(state): State<ApiState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let origin = parse_system(&request.sistema_origen)?;
    let destination = parse_system(&request.sistema_destino)?;

    // One bad grade never blocks the rest: each item converts (or fails)
    // in place, in input order.
    let resultados = request
        .valores
        .iter()
        .map(|raw| {
            let outcome = NativeValue::from_wire(origin, raw)
                .and_then(|value| state.engine.convert(origin, destination, &value));
            match outcome {
                Ok(o) => BatchItem {
                    exito: true,
                    resultado: Some(ConvertResponse {
                        valor_convertido: o.native_destination.to_wire(),
                        clasificacion: o.classification,
                        descripcion: o.description,
                        metadatos: ConvertMetadata {
                            metodologia: o.methodology,
                            valor_normalizado: o.normalized.get(),
                        },
                    }),
                    error: None,
                },
                Err(e) => BatchItem {
                    exito: false,
                    resultado: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();
    Ok(Json(BatchResponse { resultados }))
}

async fn table_dump(
    State(state): State<ApiState>,
    Path((origen, destino)): Path<(String, String)>,
) -> Result<Json<TableResponse>, ApiError> {
    let origin = parse_system(&origen)?;
    let destination = parse_system(&destino)?;
    let table = state
        .engine
        .tables()
        .table(origin, destination, None)
        .map_err(conversion_error)?;
    let tabla = table
        .entries
        .iter()
        .map(|e| TableRow {
            origen: e.origin_band.clone(),
            destino: e.destination_band.clone(),
            descripcion: e.description.clone(),
        })
        .collect();
    Ok(Json(TableResponse {
        version: table.version,
        tabla,
    }))
}

async fn rules_overview(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let summary = state.engine.tables().summary();
    let version = summary.iter().map(|(_, _, v, _)| *v).max().unwrap_or(0);

    let mut sistemas = serde_json::Map::new();
    for system in GradeSystem::ALL {
        sistemas.insert(
            system.code().to_string(),
            serde_json::json!({
                "pais": system.label(),
                "escala": system.scale_description(),
            }),
        );
    }

    let mut tablas = serde_json::Map::new();
    for (origin, destination, table_version, bands) in summary {
        tablas.insert(
            format!("{}_{}", origin.code(), destination.code()),
            serde_json::json!({ "version": table_version, "bandas": bands }),
        );
    }

    Json(serde_json::json!({
        "version": version,
        "metodologia": "Normalización lineal a escala 0-100 con bandas por sistema destino",
        "sistemas": sistemas,
        "tablas": tablas,
    }))
}
