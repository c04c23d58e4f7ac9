//! System value model: per-system normalization and denormalization.
//!
//! Every system maps onto the common 0-100 scale here and nowhere else.
//! Values outside a system's declared domain are rejected with
//! `InvalidRange` at this boundary, never clamped. Denormalization
//! re-applies each system's preferred native representation in a fixed
//! priority order, independent of the shape of the input value.

use crate::error::ConversionError;
use crate::models::{
    ArGrade, DeGrade, GradeSystem, NativeValue, NormalizedValue, Tendencia, UkGrade, UsGrade,
};

// ---------------------------------------------------------------------------
// Fixed lookup tables
// ---------------------------------------------------------------------------

/// US letter -> percentage midpoint of the letter's conventional band.
const US_LETTER_MIDPOINTS: &[(&str, f64)] = &[
    ("A+", 98.0),
    ("A", 95.0),
    ("A-", 91.0),
    ("B+", 88.0),
    ("B", 85.0),
    ("B-", 81.0),
    ("C+", 78.0),
    ("C", 75.0),
    ("C-", 71.0),
    ("D+", 68.0),
    ("D", 65.0),
    ("D-", 61.0),
    ("F", 30.0),
];

/// UK legacy letter -> GCSE 1-9 numeric equivalent.
const UK_LETTER_TO_NUMERIC: &[(&str, f64)] = &[
    ("A*", 9.0),
    ("A", 7.0),
    ("B", 6.0),
    ("C", 4.0),
    ("D", 3.0),
    ("E", 2.0),
    ("F", 1.5),
    ("G", 1.0),
    ("U", 0.0),
];

/// German tendency shift in scale-points: "2+" reads as 1.75, "2-" as 2.25.
const DE_TENDENCIA_OFFSET: f64 = 0.25;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map a native value onto the common 0-100 scale.
pub fn normalize(value: &NativeValue) -> Result<NormalizedValue, ConversionError> {
    match value {
        NativeValue::Ar(g) => normalize_ar(g),
        NativeValue::Us(g) => normalize_us(g),
        NativeValue::Uk(g) => normalize_uk(g),
        NativeValue::De(g) => normalize_de(g),
    }
}

fn normalize_ar(grade: &ArGrade) -> Result<NormalizedValue, ConversionError> {
    check_range(GradeSystem::Ar, "nota", grade.nota, 1.0, 10.0)?;
    Ok(NormalizedValue::clamped((grade.nota / 10.0) * 100.0))
}

fn normalize_us(grade: &UsGrade) -> Result<NormalizedValue, ConversionError> {
    if let Some(p) = grade.porcentaje {
        check_range(GradeSystem::Us, "porcentaje", p, 0.0, 100.0)?;
        return Ok(NormalizedValue::clamped(p));
    }
    if let Some(letra) = &grade.letra {
        let key = letra.trim().to_ascii_uppercase();
        return US_LETTER_MIDPOINTS
            .iter()
            .find(|(l, _)| *l == key)
            .map(|(_, midpoint)| NormalizedValue::clamped(*midpoint))
            .ok_or_else(|| ConversionError::InvalidRange {
                system: GradeSystem::Us,
                detail: format!("unknown letter grade: {letra}"),
            });
    }
    if let Some(gpa) = grade.gpa {
        check_range(GradeSystem::Us, "gpa", gpa, 0.0, 4.0)?;
        return Ok(NormalizedValue::clamped((gpa / 4.0) * 100.0));
    }
    Err(ConversionError::InvalidRange {
        system: GradeSystem::Us,
        detail: "value carries neither letra, porcentaje nor gpa".to_string(),
    })
}

fn normalize_uk(grade: &UkGrade) -> Result<NormalizedValue, ConversionError> {
    if let Some(n) = grade.numerico {
        check_range(GradeSystem::Uk, "numerico", n, 1.0, 9.0)?;
        return Ok(NormalizedValue::clamped((n / 9.0) * 100.0));
    }
    if let Some(letra) = &grade.letra {
        let key = letra.trim().to_ascii_uppercase();
        return UK_LETTER_TO_NUMERIC
            .iter()
            .find(|(l, _)| *l == key)
            .map(|(_, numeric)| NormalizedValue::clamped((numeric / 9.0) * 100.0))
            .ok_or_else(|| ConversionError::InvalidRange {
                system: GradeSystem::Uk,
                detail: format!("unknown legacy letter grade: {letra}"),
            });
    }
    Err(ConversionError::InvalidRange {
        system: GradeSystem::Uk,
        detail: "value carries neither numerico nor letra".to_string(),
    })
}

fn normalize_de(grade: &DeGrade) -> Result<NormalizedValue, ConversionError> {
    check_range(GradeSystem::De, "nota", grade.nota, 1.0, 6.0)?;
    let shifted = match grade.tendencia {
        Some(Tendencia::Plus) => grade.nota - DE_TENDENCIA_OFFSET,
        Some(Tendencia::Minus) => grade.nota + DE_TENDENCIA_OFFSET,
        None => grade.nota,
    };
    // The shift may not push the effective grade past the scale ends.
    let effective = shifted.clamp(1.0, 6.0);
    Ok(NormalizedValue::clamped((6.0 - effective) / 5.0 * 100.0))
}

fn check_range(
    system: GradeSystem,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConversionError> {
    if value.is_nan() || !(min..=max).contains(&value) {
        return Err(ConversionError::InvalidRange {
            system,
            detail: format!("{field} = {value} outside [{min}, {max}]"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Denormalization
// ---------------------------------------------------------------------------

/// Render a normalized value in a destination system's preferred native
/// representation. The representation choice is fixed per system: AR a
/// half-step nota, US letter plus whole percentage, UK GCSE numeric with
/// the letter alongside, DE a one-decimal nota.
pub fn denormalize(system: GradeSystem, normalized: NormalizedValue) -> NativeValue {
    let n = normalized.get();
    match system {
        GradeSystem::Ar => {
            let nota = ((n / 10.0) * 2.0).round() / 2.0;
            NativeValue::Ar(ArGrade {
                nota: nota.clamp(1.0, 10.0),
                instancia: None,
            })
        }
        GradeSystem::Us => NativeValue::Us(UsGrade {
            letra: Some(us_letter_for(n).to_string()),
            porcentaje: Some(n.round()),
            gpa: None,
        }),
        GradeSystem::Uk => {
            let numerico = ((n / 100.0) * 9.0).round();
            // Below the lowest graded step there is no GCSE number:
            // the result is ungraded, mirroring the U -> 0 letter entry.
            if numerico < 1.0 {
                return NativeValue::Uk(UkGrade {
                    letra: Some("U".to_string()),
                    numerico: None,
                    puntos: None,
                    modulo_notas: None,
                });
            }
            let numerico = numerico.min(9.0);
            NativeValue::Uk(UkGrade {
                letra: Some(uk_letter_for(numerico).to_string()),
                numerico: Some(numerico),
                puntos: None,
                modulo_notas: None,
            })
        }
        GradeSystem::De => {
            let nota = (6.0 - (n / 100.0) * 5.0).clamp(1.0, 6.0);
            NativeValue::De(DeGrade {
                nota: (nota * 10.0).round() / 10.0,
                tendencia: None,
                puntos: None,
            })
        }
    }
}

/// US letter for a percentage, conventional 10-point bands.
pub(crate) fn us_letter_for(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A"
    } else if percentage >= 80.0 {
        "B"
    } else if percentage >= 70.0 {
        "C"
    } else if percentage >= 60.0 {
        "D"
    } else {
        "F"
    }
}

/// Legacy letter rendering for a GCSE numeric grade.
pub(crate) fn uk_letter_for(numerico: f64) -> &'static str {
    if numerico >= 8.0 {
        "A*"
    } else if numerico >= 7.0 {
        "A"
    } else if numerico >= 5.0 {
        "B"
    } else if numerico >= 4.0 {
        "C"
    } else if numerico >= 3.0 {
        "D"
    } else if numerico >= 2.0 {
        "E"
    } else {
        "G"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar(nota: f64) -> NativeValue {
        NativeValue::Ar(ArGrade {
            nota,
            instancia: None,
        })
    }

    fn de(nota: f64, tendencia: Option<Tendencia>) -> NativeValue {
        NativeValue::De(DeGrade {
            nota,
            tendencia,
            puntos: None,
        })
    }

    #[test]
    fn ar_normalizes_linearly() {
        assert_eq!(normalize(&ar(8.0)).unwrap().get(), 80.0);
        assert_eq!(normalize(&ar(10.0)).unwrap().get(), 100.0);
        assert_eq!(normalize(&ar(1.0)).unwrap().get(), 10.0);
    }

    #[test]
    fn ar_rejects_out_of_domain() {
        assert!(normalize(&ar(11.0)).is_err());
        assert!(normalize(&ar(0.5)).is_err());
    }

    #[test]
    fn us_prefers_porcentaje_over_letra_and_gpa() {
        let v = NativeValue::Us(UsGrade {
            letra: Some("F".to_string()),
            porcentaje: Some(92.0),
            gpa: Some(1.0),
        });
        assert_eq!(normalize(&v).unwrap().get(), 92.0);
    }

    #[test]
    fn us_letter_and_gpa_fallbacks() {
        let by_letter = NativeValue::Us(UsGrade {
            letra: Some("b".to_string()),
            ..Default::default()
        });
        assert_eq!(normalize(&by_letter).unwrap().get(), 85.0);

        let by_gpa = NativeValue::Us(UsGrade {
            gpa: Some(4.0),
            ..Default::default()
        });
        assert_eq!(normalize(&by_gpa).unwrap().get(), 100.0);

        let empty = NativeValue::Us(UsGrade::default());
        assert!(normalize(&empty).is_err());
    }

    #[test]
    fn uk_numeric_and_legacy_letters() {
        let nine = NativeValue::Uk(UkGrade {
            numerico: Some(9.0),
            ..Default::default()
        });
        assert_eq!(normalize(&nine).unwrap().get(), 100.0);

        let a_star = NativeValue::Uk(UkGrade {
            letra: Some("A*".to_string()),
            ..Default::default()
        });
        assert_eq!(normalize(&a_star).unwrap().get(), 100.0);

        let u = NativeValue::Uk(UkGrade {
            letra: Some("U".to_string()),
            ..Default::default()
        });
        assert_eq!(normalize(&u).unwrap().get(), 0.0);
    }

    #[test]
    fn de_scale_is_inverted() {
        assert_eq!(normalize(&de(1.0, None)).unwrap().get(), 100.0);
        assert_eq!(normalize(&de(6.0, None)).unwrap().get(), 0.0);
        assert!((normalize(&de(3.5, None)).unwrap().get() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn de_tendencia_shifts_before_inversion() {
        let plain = normalize(&de(2.0, None)).unwrap().get();
        let plus = normalize(&de(2.0, Some(Tendencia::Plus))).unwrap().get();
        let minus = normalize(&de(2.0, Some(Tendencia::Minus))).unwrap().get();
        assert!(plus > plain && plain > minus);
        // Shift clamps at the scale ends, never escaping the domain.
        assert_eq!(normalize(&de(1.0, Some(Tendencia::Plus))).unwrap().get(), 100.0);
    }

    #[test]
    fn round_trip_stays_within_half_normalized_point() {
        // Conventional-step values per system round-trip within tolerance.
        let cases: Vec<NativeValue> = vec![
            ar(7.5),
            ar(10.0),
            NativeValue::Us(UsGrade {
                porcentaje: Some(87.0),
                ..Default::default()
            }),
            NativeValue::Uk(UkGrade {
                numerico: Some(6.0),
                ..Default::default()
            }),
            de(2.3, None),
        ];
        for original in cases {
            let system = original.system();
            let n1 = normalize(&original).unwrap();
            let round_tripped = denormalize(system, n1);
            let n2 = normalize(&round_tripped).unwrap();
            assert!(
                (n1.get() - n2.get()).abs() <= 0.5,
                "round trip drifted for {original:?}: {} vs {}",
                n1.get(),
                n2.get()
            );
        }
    }

    #[test]
    fn uk_fail_region_renders_as_ungraded() {
        // An ungraded UK result carries no GCSE number at all.
        match denormalize(GradeSystem::Uk, NormalizedValue::new(0.0).unwrap()) {
            NativeValue::Uk(g) => {
                assert_eq!(g.letra.as_deref(), Some("U"));
                assert_eq!(g.numerico, None);
            }
            other => panic!("unexpected shape: {other:?}"),
        }

        // Letter U normalizes to the floor and stays there on the way
        // back, instead of resurfacing as a graded mark.
        let u = NativeValue::Uk(UkGrade {
            letra: Some("U".to_string()),
            ..Default::default()
        });
        let n1 = normalize(&u).unwrap();
        assert_eq!(n1.get(), 0.0);
        let round_tripped = denormalize(GradeSystem::Uk, n1);
        let n2 = normalize(&round_tripped).unwrap();
        assert!(
            (n1.get() - n2.get()).abs() <= 0.5,
            "U round trip drifted: {} vs {}",
            n1.get(),
            n2.get()
        );

        // The first graded step still renders with its number.
        match denormalize(GradeSystem::Uk, NormalizedValue::new(11.0).unwrap()) {
            NativeValue::Uk(g) => assert_eq!(g.numerico, Some(1.0)),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn denormalize_preferred_representations() {
        match denormalize(GradeSystem::Us, NormalizedValue::new(80.0).unwrap()) {
            NativeValue::Us(g) => {
                assert_eq!(g.letra.as_deref(), Some("B"));
                assert_eq!(g.porcentaje, Some(80.0));
                assert_eq!(g.gpa, None);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
        match denormalize(GradeSystem::Ar, NormalizedValue::new(100.0).unwrap()) {
            NativeValue::Ar(g) => assert_eq!(g.nota, 10.0),
            other => panic!("unexpected shape: {other:?}"),
        }
        // Floor of the AR scale is 1.0, never 0.
        match denormalize(GradeSystem::Ar, NormalizedValue::new(2.0).unwrap()) {
            NativeValue::Ar(g) => assert_eq!(g.nota, 1.0),
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
