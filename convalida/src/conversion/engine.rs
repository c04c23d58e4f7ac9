//! Conversion engine: normalize -> band lookup -> denormalize.
//!
//! Pure and stateless apart from the shared read-only table registry;
//! safe for unbounded parallel invocation.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::conversion::scale;
use crate::conversion::table::{classify, RuleTableRegistry};
use crate::error::ConversionError;
use crate::models::{GradeSystem, NativeValue, NormalizedValue};

/// Result of a single grade conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub normalized: NormalizedValue,
    pub native_destination: NativeValue,
    pub classification: String,
    pub description: String,
    pub methodology: String,
}

pub struct ConversionEngine {
    tables: Arc<RuleTableRegistry>,
}

impl ConversionEngine {
    pub fn new(tables: Arc<RuleTableRegistry>) -> Self {
        ConversionEngine { tables }
    }

    /// Engine over the built-in v1 tables for every directed pair.
    pub fn with_defaults() -> Self {
        ConversionEngine::new(Arc::new(RuleTableRegistry::with_defaults()))
    }

    pub fn tables(&self) -> &Arc<RuleTableRegistry> {
        &self.tables
    }

    /// Convert one grade between systems, pinned to the current table
    /// version.
    pub fn convert(
        &self,
        origin: GradeSystem,
        destination: GradeSystem,
        value: &NativeValue,
    ) -> Result<ConversionOutcome, ConversionError> {
        self.convert_versioned(origin, destination, value, None)
    }

    /// Convert one grade, optionally pinned to a table version.
    pub fn convert_versioned(
        &self,
        origin: GradeSystem,
        destination: GradeSystem,
        value: &NativeValue,
        version: Option<u32>,
    ) -> Result<ConversionOutcome, ConversionError> {
        if value.system() != origin {
            return Err(ConversionError::SystemMismatch {
                declared: origin,
                actual: value.system(),
            });
        }
        let normalized = scale::normalize(value)?;

        // Identity conversion short-circuits the table but still runs the
        // normalize/denormalize pass, so invalid input fails identically.
        if origin == destination {
            let native_destination = scale::denormalize(destination, normalized);
            let band = classify(origin, normalized);
            debug!(%origin, %normalized, "identity conversion");
            return Ok(ConversionOutcome {
                normalized,
                native_destination,
                classification: band.classification.to_string(),
                description: band.label.to_string(),
                methodology: "Conversión idéntica (mismo sistema)".to_string(),
            });
        }

        let table = self.tables.table(origin, destination, version)?;
        let entry = table.lookup_band(normalized)?;
        // Denormalize from the precise normalized value, not the band
        // midpoint, so the destination value is interpolated inside the
        // band.
        let native_destination = scale::denormalize(destination, normalized);
        debug!(
            %origin,
            %destination,
            %normalized,
            band = %entry.destination_band,
            "converted grade"
        );
        Ok(ConversionOutcome {
            normalized,
            native_destination,
            classification: entry.classification.clone(),
            description: entry.description.clone(),
            methodology: table.methodology.clone(),
        })
    }

    /// Convert a batch, preserving input order and length. Per-item
    /// failures are isolated: one invalid grade does not abort the rest.
    pub fn convert_batch(
        &self,
        origin: GradeSystem,
        destination: GradeSystem,
        values: &[NativeValue],
    ) -> Vec<Result<ConversionOutcome, ConversionError>> {
        values
            .iter()
            .map(|v| self.convert(origin, destination, v))
            .collect()
    }
}
