//! Versioned conversion rule tables.
//!
//! A `ConversionRule` maps a directed (origin, destination) system pair
//! through ordered bands expressed in normalized 0-100 space. Tables are
//! validated at publication time (full coverage, no gaps, no overlaps)
//! and are immutable once published: a rule change is a new version.
//! The registry swaps the current-version pointer under a write lock, so
//! in-flight conversions holding an `Arc` handle finish against a
//! consistent table.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::error::{ConversionError, TableError};
use crate::models::{GradeSystem, NormalizedValue};

const EPS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Canonical classification bands per system
// ---------------------------------------------------------------------------

/// One classification band of a system, in normalized space. `min` is
/// inclusive; the band reaches up to the next better band's `min`
/// (exclusive), or to 100 inclusive for the top band.
#[derive(Debug, Clone, Copy)]
pub struct SystemBand {
    pub min: f64,
    /// Native rendering of the band ("B (80-89%)", "1.0 - 1.5 (sehr gut)").
    pub label: &'static str,
    /// Classification term reported to callers.
    pub classification: &'static str,
}

const AR_BANDS: &[SystemBand] = &[
    SystemBand { min: 90.0, label: "9.0 - 10.0", classification: "Sobresaliente" },
    SystemBand { min: 70.0, label: "7.0 - 8.9", classification: "Muy Bueno" },
    SystemBand { min: 60.0, label: "6.0 - 6.9", classification: "Bueno" },
    SystemBand { min: 40.0, label: "4.0 - 5.9", classification: "Aprobado" },
    SystemBand { min: 0.0, label: "1.0 - 3.9", classification: "Insuficiente" },
];

const US_BANDS: &[SystemBand] = &[
    SystemBand { min: 90.0, label: "A (90-100%)", classification: "Excelente" },
    SystemBand { min: 80.0, label: "B (80-89%)", classification: "Bueno" },
    SystemBand { min: 70.0, label: "C (70-79%)", classification: "Satisfactorio" },
    SystemBand { min: 60.0, label: "D (60-69%)", classification: "Suficiente" },
    SystemBand { min: 0.0, label: "F (0-59%)", classification: "Insuficiente" },
];

const UK_BANDS: &[SystemBand] = &[
    SystemBand { min: 85.0, label: "8-9 (A*)", classification: "Sobresaliente" },
    SystemBand { min: 70.0, label: "7 (A)", classification: "Excelente" },
    SystemBand { min: 50.0, label: "5-6 (B)", classification: "Bueno" },
    SystemBand { min: 40.0, label: "4 (C)", classification: "Aprobado" },
    SystemBand { min: 0.0, label: "1-3 (D-U)", classification: "Insuficiente" },
];

const DE_BANDS: &[SystemBand] = &[
    SystemBand { min: 90.0, label: "1.0 - 1.5 (sehr gut)", classification: "Sobresaliente" },
    SystemBand { min: 70.0, label: "1.6 - 2.5 (gut)", classification: "Muy Bueno" },
    SystemBand { min: 50.0, label: "2.6 - 3.5 (befriedigend)", classification: "Bueno" },
    SystemBand { min: 40.0, label: "3.6 - 4.0 (ausreichend)", classification: "Aprobado" },
    SystemBand { min: 0.0, label: "4.1 - 6.0 (nicht ausreichend)", classification: "Insuficiente" },
];

/// Canonical classification bands of a system, best first.
pub fn classification_bands(system: GradeSystem) -> &'static [SystemBand] {
    match system {
        GradeSystem::Ar => AR_BANDS,
        GradeSystem::Us => US_BANDS,
        GradeSystem::Uk => UK_BANDS,
        GradeSystem::De => DE_BANDS,
    }
}

/// Classify a normalized value against a system's own bands. Used for
/// identity conversions, which never consult a cross-system table.
pub fn classify(system: GradeSystem, value: NormalizedValue) -> &'static SystemBand {
    let bands = classification_bands(system);
    bands
        .iter()
        .find(|b| value.get() >= b.min)
        .unwrap_or(&bands[bands.len() - 1])
}

// ---------------------------------------------------------------------------
// ConversionRule: one published table
// ---------------------------------------------------------------------------

/// One band row of a conversion table, in normalized space. Bands are
/// stored best first; `band_min` is inclusive and the boundary belongs to
/// the better-performing band.
#[derive(Debug, Clone, Serialize)]
pub struct RuleEntry {
    pub band_min: f64,
    pub band_max: f64,
    /// Native rendering of the band in the origin system.
    pub origin_band: String,
    /// Native rendering of the band in the destination system.
    pub destination_band: String,
    pub classification: String,
    pub description: String,
}

/// A published, immutable conversion table for one directed pair.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionRule {
    pub system_origin: GradeSystem,
    pub system_destination: GradeSystem,
    pub version: u32,
    pub methodology: String,
    pub entries: Vec<RuleEntry>,
}

impl ConversionRule {
    /// Load-time validation: entries in descending order, contiguous, and
    /// covering [0,100] exactly. Checked once at publication, not per
    /// conversion.
    pub fn validate(&self) -> Result<(), TableError> {
        let (origin, destination) = (self.system_origin, self.system_destination);
        if self.entries.is_empty() {
            return Err(TableError::Empty { origin, destination });
        }
        let top = &self.entries[0];
        let bottom = &self.entries[self.entries.len() - 1];
        if (top.band_max - 100.0).abs() > EPS || bottom.band_min.abs() > EPS {
            return Err(TableError::NotCovering {
                origin,
                destination,
                min: bottom.band_min,
                max: top.band_max,
            });
        }
        for (index, pair) in self.entries.windows(2).enumerate() {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.band_min <= lower.band_min {
                return Err(TableError::NotDescending {
                    origin,
                    destination,
                    index: index + 1,
                });
            }
            let delta = upper.band_min - lower.band_max;
            if delta > EPS {
                return Err(TableError::Gap {
                    origin,
                    destination,
                    upper: upper.band_min,
                    lower: lower.band_max,
                });
            }
            if delta < -EPS {
                return Err(TableError::Overlap {
                    origin,
                    destination,
                    upper: upper.band_min,
                    lower: lower.band_max,
                });
            }
        }
        Ok(())
    }

    /// First band (best first) containing the value. The shared boundary
    /// between two bands resolves to the better one, since its inclusive
    /// `band_min` is checked first.
    pub fn lookup_band(&self, value: NormalizedValue) -> Result<&RuleEntry, ConversionError> {
        let v = value.get();
        // Unreachable through `normalize`, checked defensively anyway.
        if !(0.0..=100.0).contains(&v) {
            return Err(ConversionError::OutOfRange { value: v });
        }
        self.entries
            .iter()
            .find(|e| v >= e.band_min)
            .ok_or(ConversionError::OutOfRange { value: v })
    }
}

// ---------------------------------------------------------------------------
// Default table construction
// ---------------------------------------------------------------------------

/// Native rendering of a normalized span in a system's own scale. DE is
/// inverted: the best nota sits at the span's upper normalized end.
fn native_span_label(system: GradeSystem, min: f64, max: f64) -> String {
    match system {
        GradeSystem::Ar => format!("{:.1} - {:.1}", min / 10.0, max / 10.0),
        GradeSystem::Us => format!("{:.0}% - {:.0}%", min, max),
        GradeSystem::Uk => format!("{:.0} - {:.0}", min * 9.0 / 100.0, max * 9.0 / 100.0),
        GradeSystem::De => format!(
            "{:.1} - {:.1}",
            6.0 - max * 5.0 / 100.0,
            6.0 - min * 5.0 / 100.0
        ),
    }
}

/// Build the built-in v1 table for a directed pair: the destination
/// system's canonical bands, with the origin column rendered in the
/// origin system's native scale.
pub fn default_rule(origin: GradeSystem, destination: GradeSystem) -> ConversionRule {
    let bands = classification_bands(destination);
    let mut entries = Vec::with_capacity(bands.len());
    let mut upper = 100.0;
    for band in bands {
        let origin_band = native_span_label(origin, band.min, upper);
        entries.push(RuleEntry {
            band_min: band.min,
            band_max: upper,
            origin_band: origin_band.clone(),
            destination_band: band.label.to_string(),
            classification: band.classification.to_string(),
            description: format!(
                "{} ({}) -> {} ({})",
                origin_band,
                origin.code(),
                band.label,
                destination.code()
            ),
        });
        upper = band.min;
    }
    ConversionRule {
        system_origin: origin,
        system_destination: destination,
        version: 1,
        methodology: "Normalización lineal a escala 0-100 con bandas por sistema destino"
            .to_string(),
        entries,
    }
}

// ---------------------------------------------------------------------------
// RuleTableRegistry: versioned publication and lookup
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PairVersions {
    current: u32,
    versions: BTreeMap<u32, Arc<ConversionRule>>,
}

/// Holds every published table, versioned per directed pair. Callers pin
/// a version or receive the current one; republishing never mutates a
/// published table.
pub struct RuleTableRegistry {
    tables: RwLock<HashMap<(GradeSystem, GradeSystem), PairVersions>>,
}

impl RuleTableRegistry {
    pub fn new() -> Self {
        RuleTableRegistry {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-loaded with the built-in v1 table for every directed
    /// pair of distinct systems.
    pub fn with_defaults() -> Self {
        let registry = RuleTableRegistry::new();
        for origin in GradeSystem::ALL {
            for destination in GradeSystem::ALL {
                if origin != destination {
                    registry
                        .publish(default_rule(origin, destination))
                        .expect("built-in tables are valid");
                }
            }
        }
        registry
    }

    /// Validate and publish a table. The version must be new for the
    /// pair; the highest published version becomes current.
    pub fn publish(&self, rule: ConversionRule) -> Result<u32, TableError> {
        rule.validate()?;
        let key = (rule.system_origin, rule.system_destination);
        let version = rule.version;
        let mut tables = self.tables.write().expect("rule registry lock poisoned");
        let slot = tables.entry(key).or_default();
        if slot.versions.contains_key(&version) {
            return Err(TableError::VersionExists {
                origin: key.0,
                destination: key.1,
                version,
            });
        }
        slot.versions.insert(version, Arc::new(rule));
        if version > slot.current {
            slot.current = version;
        }
        Ok(version)
    }

    /// Fetch a table for the pair, pinned to `version` or the current one.
    pub fn table(
        &self,
        origin: GradeSystem,
        destination: GradeSystem,
        version: Option<u32>,
    ) -> Result<Arc<ConversionRule>, ConversionError> {
        let tables = self.tables.read().expect("rule registry lock poisoned");
        let slot = tables
            .get(&(origin, destination))
            .filter(|s| !s.versions.is_empty())
            .ok_or(ConversionError::NoTable {
                origin,
                destination,
            })?;
        match version {
            Some(v) => slot
                .versions
                .get(&v)
                .cloned()
                .ok_or(ConversionError::NoTableVersion {
                    origin,
                    destination,
                    version: v,
                }),
            None => Ok(slot
                .versions
                .get(&slot.current)
                .cloned()
                .expect("current version always published")),
        }
    }

    pub fn current_version(&self, origin: GradeSystem, destination: GradeSystem) -> Option<u32> {
        let tables = self.tables.read().expect("rule registry lock poisoned");
        tables
            .get(&(origin, destination))
            .filter(|s| !s.versions.is_empty())
            .map(|s| s.current)
    }

    /// Summary of every published pair: (origin, destination, current
    /// version, band count). Used by the rules endpoint.
    pub fn summary(&self) -> Vec<(GradeSystem, GradeSystem, u32, usize)> {
        let tables = self.tables.read().expect("rule registry lock poisoned");
        let mut out: Vec<_> = tables
            .iter()
            .filter(|(_, s)| !s.versions.is_empty())
            .map(|((o, d), s)| {
                let bands = s.versions[&s.current].entries.len();
                (*o, *d, s.current, bands)
            })
            .collect();
        out.sort_by_key(|(o, d, _, _)| (o.code(), d.code()));
        out
    }
}

impl Default for RuleTableRegistry {
    fn default() -> Self {
        RuleTableRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(min: f64, max: f64) -> RuleEntry {
        RuleEntry {
            band_min: min,
            band_max: max,
            origin_band: format!("{min}-{max}"),
            destination_band: format!("{min}-{max}"),
            classification: "x".to_string(),
            description: String::new(),
        }
    }

    fn rule(entries: Vec<RuleEntry>) -> ConversionRule {
        ConversionRule {
            system_origin: GradeSystem::Ar,
            system_destination: GradeSystem::Us,
            version: 7,
            methodology: "test".to_string(),
            entries,
        }
    }

    #[test]
    fn validate_rejects_gap() {
        let r = rule(vec![entry(90.0, 100.0), entry(0.0, 85.0)]);
        assert!(matches!(r.validate(), Err(TableError::Gap { .. })));
    }

    #[test]
    fn validate_rejects_overlap() {
        let r = rule(vec![entry(80.0, 100.0), entry(0.0, 85.0)]);
        assert!(matches!(r.validate(), Err(TableError::Overlap { .. })));
    }

    #[test]
    fn validate_rejects_partial_coverage() {
        let r = rule(vec![entry(90.0, 100.0), entry(10.0, 90.0)]);
        assert!(matches!(r.validate(), Err(TableError::NotCovering { .. })));

        let r = rule(vec![entry(50.0, 95.0), entry(0.0, 50.0)]);
        assert!(matches!(r.validate(), Err(TableError::NotCovering { .. })));
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(matches!(rule(vec![]).validate(), Err(TableError::Empty { .. })));
    }

    #[test]
    fn boundary_resolves_to_better_band() {
        let r = default_rule(GradeSystem::Ar, GradeSystem::Us);
        let at_90 = r.lookup_band(NormalizedValue::new(90.0).unwrap()).unwrap();
        assert_eq!(at_90.destination_band, "A (90-100%)");
        let just_below = r.lookup_band(NormalizedValue::new(89.999).unwrap()).unwrap();
        assert_eq!(just_below.destination_band, "B (80-89%)");
    }

    #[test]
    fn registry_defaults_cover_all_directed_pairs() {
        let registry = RuleTableRegistry::with_defaults();
        for origin in GradeSystem::ALL {
            for destination in GradeSystem::ALL {
                if origin == destination {
                    assert!(registry.table(origin, destination, None).is_err());
                } else {
                    let table = registry
                        .table(origin, destination, None)
                        .expect("default table");
                    table.validate().expect("default table valid");
                    assert_eq!(table.version, 1);
                }
            }
        }
    }

    #[test]
    fn republishing_swaps_current_without_touching_old_versions() {
        let registry = RuleTableRegistry::with_defaults();
        let v1 = registry
            .table(GradeSystem::Ar, GradeSystem::Us, None)
            .unwrap();

        let mut v2 = default_rule(GradeSystem::Ar, GradeSystem::Us);
        v2.version = 2;
        v2.methodology = "revised".to_string();
        registry.publish(v2).expect("publish v2");

        // Current pointer moved; the pinned v1 handle is untouched.
        assert_eq!(registry.current_version(GradeSystem::Ar, GradeSystem::Us), Some(2));
        let pinned = registry
            .table(GradeSystem::Ar, GradeSystem::Us, Some(1))
            .expect("v1 still published");
        assert_eq!(pinned.methodology, v1.methodology);

        // Versions are immutable once published.
        let mut dup = default_rule(GradeSystem::Ar, GradeSystem::Us);
        dup.version = 2;
        assert!(matches!(
            registry.publish(dup),
            Err(TableError::VersionExists { version: 2, .. })
        ));
    }

    #[test]
    fn missing_pair_and_version_are_distinct_errors() {
        let registry = RuleTableRegistry::new();
        assert!(matches!(
            registry.table(GradeSystem::Ar, GradeSystem::Us, None),
            Err(ConversionError::NoTable { .. })
        ));

        registry
            .publish(default_rule(GradeSystem::Ar, GradeSystem::Us))
            .unwrap();
        assert!(matches!(
            registry.table(GradeSystem::Ar, GradeSystem::Us, Some(9)),
            Err(ConversionError::NoTableVersion { version: 9, .. })
        ));
    }
}
