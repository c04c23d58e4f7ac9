//! Grade value model: systems, native shapes and the normalized scale.
//!
//! A grade is always one of four closed shapes, one per national system.
//! Every consumer matches all four variants explicitly; there is no
//! dynamically-shaped value anywhere in the engine. The 0-100
//! `NormalizedValue` is the only interchange representation: no
//! system-to-system conversion skips it.

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

// ---------------------------------------------------------------------------
// GradeSystem: the four supported national conventions
// ---------------------------------------------------------------------------

/// National grading system. Process-wide constant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeSystem {
    /// Argentina, 1.0-10.0 numeric scale.
    #[serde(rename = "AR")]
    Ar,
    /// United States, letter / percentage / GPA.
    #[serde(rename = "US")]
    Us,
    /// United Kingdom, GCSE 1-9 numeric with legacy letters.
    #[serde(rename = "UK")]
    Uk,
    /// Germany, 1.0 (best) - 6.0 (worst), inverted scale.
    #[serde(rename = "DE")]
    De,
}

impl GradeSystem {
    pub const ALL: [GradeSystem; 4] = [
        GradeSystem::Ar,
        GradeSystem::Us,
        GradeSystem::Uk,
        GradeSystem::De,
    ];

    /// Wire code used throughout the API surface.
    pub fn code(&self) -> &'static str {
        match self {
            GradeSystem::Ar => "AR",
            GradeSystem::Us => "US",
            GradeSystem::Uk => "UK",
            GradeSystem::De => "DE",
        }
    }

    /// Human-readable country label, defined once here.
    pub fn label(&self) -> &'static str {
        match self {
            GradeSystem::Ar => "Argentina",
            GradeSystem::Us => "Estados Unidos",
            GradeSystem::Uk => "Reino Unido",
            GradeSystem::De => "Alemania",
        }
    }

    /// Short description of the native scale.
    pub fn scale_description(&self) -> &'static str {
        match self {
            GradeSystem::Ar => "Escala numerica 1.0 - 10.0",
            GradeSystem::Us => "Letras A-F, porcentaje 0-100, GPA 0.0-4.0",
            GradeSystem::Uk => "GCSE 1-9 (9 mejor), letras legado A*-U",
            GradeSystem::De => "Escala invertida 1.0 (mejor) - 6.0 (peor)",
        }
    }

    pub fn from_code(code: &str) -> Option<GradeSystem> {
        match code {
            "AR" => Some(GradeSystem::Ar),
            "US" => Some(GradeSystem::Us),
            "UK" => Some(GradeSystem::Uk),
            "DE" => Some(GradeSystem::De),
            _ => None,
        }
    }
}

impl std::fmt::Display for GradeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for GradeSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeSystem::from_code(s).ok_or_else(|| format!("unknown grade system: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Native value shapes, one per system
// ---------------------------------------------------------------------------

/// Argentine grade: 1.0-10.0, conventionally in half steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArGrade {
    pub nota: f64,
    /// Exam instance ("final", "recuperatorio", ...). Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instancia: Option<String>,
}

/// United States grade: at least one of letter, percentage or GPA.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsGrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letra: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porcentaje: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
}

/// United Kingdom grade: GCSE 1-9 numeric, legacy letter, UCAS points
/// and optional per-module marks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UkGrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letra: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerico: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puntos: Option<f64>,
    #[serde(rename = "moduloNotas", skip_serializing_if = "Option::is_none")]
    pub modulo_notas: Option<Vec<ModuleGrade>>,
}

/// A single module mark inside a UK grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleGrade {
    pub modulo: String,
    pub nota: f64,
}

/// German grade: 1.0 best - 6.0 worst, optional tendency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeGrade {
    pub nota: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendencia: Option<Tendencia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puntos: Option<f64>,
}

/// German grade tendency: "2+" is slightly better than "2", "2-" slightly
/// worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tendencia {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

/// A grade in its origin system's own shape. Exactly one variant is
/// populated per value; the variant tag is the system.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NativeValue {
    Ar(ArGrade),
    Us(UsGrade),
    Uk(UkGrade),
    De(DeGrade),
}

impl NativeValue {
    pub fn system(&self) -> GradeSystem {
        match self {
            NativeValue::Ar(_) => GradeSystem::Ar,
            NativeValue::Us(_) => GradeSystem::Us,
            NativeValue::Uk(_) => GradeSystem::Uk,
            NativeValue::De(_) => GradeSystem::De,
        }
    }

    /// Deserialize a wire payload under an explicitly declared system.
    ///
    /// The shapes are too close to one another (`UsGrade` is all-optional)
    /// for untagged deserialization, so the system always travels beside
    /// the value on the wire and drives the parse here.
    pub fn from_wire(
        system: GradeSystem,
        payload: &serde_json::Value,
    ) -> Result<NativeValue, ConversionError> {
        let invalid = |e: serde_json::Error| ConversionError::InvalidRange {
            system,
            detail: format!("malformed value payload: {e}"),
        };
        match system {
            GradeSystem::Ar => serde_json::from_value::<ArGrade>(payload.clone())
                .map(NativeValue::Ar)
                .map_err(invalid),
            GradeSystem::Us => serde_json::from_value::<UsGrade>(payload.clone())
                .map(NativeValue::Us)
                .map_err(invalid),
            GradeSystem::Uk => serde_json::from_value::<UkGrade>(payload.clone())
                .map(NativeValue::Uk)
                .map_err(invalid),
            GradeSystem::De => serde_json::from_value::<DeGrade>(payload.clone())
                .map(NativeValue::De)
                .map_err(invalid),
        }
    }

    /// Serialize to the bare wire shape (no system tag).
    pub fn to_wire(&self) -> serde_json::Value {
        // The inner shapes only hold plain numbers and strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// NormalizedValue: the 0-100 interchange scale
// ---------------------------------------------------------------------------

/// A performance level on the common 0-100 scale, monotonic across all
/// systems (higher = better). Only constructible through the range
/// checks, so it never carries a value outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NormalizedValue(f64);

impl NormalizedValue {
    /// Construct from a raw value, rejecting anything outside [0,100].
    pub fn new(value: f64) -> Result<NormalizedValue, ConversionError> {
        if !(0.0..=100.0).contains(&value) || value.is_nan() {
            return Err(ConversionError::OutOfRange { value });
        }
        Ok(NormalizedValue(value))
    }

    /// Construct clamping into [0,100]. Used only for values derived from
    /// already-validated native fields where float arithmetic can land a
    /// hair outside the range.
    pub(crate) fn clamped(value: f64) -> NormalizedValue {
        NormalizedValue(value.clamp(0.0, 100.0))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_system_codes_round_trip() {
        for system in GradeSystem::ALL {
            assert_eq!(GradeSystem::from_code(system.code()), Some(system));
        }
        assert_eq!(GradeSystem::from_code("FR"), None);
    }

    #[test]
    fn normalized_value_rejects_out_of_range() {
        assert!(NormalizedValue::new(100.0).is_ok());
        assert!(NormalizedValue::new(0.0).is_ok());
        assert!(NormalizedValue::new(100.1).is_err());
        assert!(NormalizedValue::new(-0.1).is_err());
        assert!(NormalizedValue::new(f64::NAN).is_err());
    }

    #[test]
    fn native_value_from_wire_parses_per_system() {
        let ar = NativeValue::from_wire(GradeSystem::Ar, &serde_json::json!({"nota": 8.0}))
            .expect("AR payload");
        assert_eq!(ar.system(), GradeSystem::Ar);

        let de = NativeValue::from_wire(
            GradeSystem::De,
            &serde_json::json!({"nota": 2.0, "tendencia": "+"}),
        )
        .expect("DE payload");
        match de {
            NativeValue::De(g) => assert_eq!(g.tendencia, Some(Tendencia::Plus)),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn native_value_from_wire_rejects_malformed_payload() {
        let err = NativeValue::from_wire(GradeSystem::Ar, &serde_json::json!({"nota": "ocho"}))
            .expect_err("string nota must not parse");
        assert!(matches!(err, ConversionError::InvalidRange { .. }));
    }
}
