//! Perceptual color difference (Delta E)
//!
//! Two strategies are available:
//! - [`Ciede2000`]: the CIE standard perceptual metric, backed by the
//!   `palette` crate (cargo feature `ciede2000`, on by default)
//! - [`Cie76`]: plain Euclidean distance in L*a*b*
//!
//! A strategy is chosen once, when a [`ColorConverter`](super::ColorConverter)
//! is built, and every comparison made through that converter uses it. The
//! match-quality thresholds are the same for both methods; CIE76 distances run
//! larger than CIEDE2000 for the same perceived difference, so CIE76 sessions
//! classify more conservatively.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{color::LabColor, Result};

/// Identity of a Delta E method, recorded with every match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaEMethod {
    Ciede2000,
    Cie76,
}

impl DeltaEMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaEMethod::Ciede2000 => "CIEDE2000",
            DeltaEMethod::Cie76 => "CIE76",
        }
    }
}

impl fmt::Display for DeltaEMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested Delta E method, as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaEPreference {
    /// Most precise method compiled in
    #[default]
    Auto,
    Ciede2000,
    Cie76,
}

/// A color-difference metric over Lab colors
pub trait DeltaEStrategy: fmt::Debug + Send + Sync {
    /// Which method this strategy implements
    fn method(&self) -> DeltaEMethod;

    /// Difference between two Lab colors; symmetric, zero for identical inputs
    fn delta_e(&self, lab1: LabColor, lab2: LabColor) -> f64;
}

/// CIE76: Euclidean distance in L*a*b*
#[derive(Debug, Clone, Copy, Default)]
pub struct Cie76;

impl DeltaEStrategy for Cie76 {
    fn method(&self) -> DeltaEMethod {
        DeltaEMethod::Cie76
    }

    fn delta_e(&self, lab1: LabColor, lab2: LabColor) -> f64 {
        let dl = lab1.l - lab2.l;
        let da = lab1.a - lab2.a;
        let db = lab1.b - lab2.b;
        (dl * dl + da * da + db * db).sqrt()
    }
}

/// CIEDE2000 via `palette`
#[cfg(feature = "ciede2000")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Ciede2000;

#[cfg(feature = "ciede2000")]
impl DeltaEStrategy for Ciede2000 {
    fn method(&self) -> DeltaEMethod {
        DeltaEMethod::Ciede2000
    }

    fn delta_e(&self, lab1: LabColor, lab2: LabColor) -> f64 {
        use palette::{color_difference::Ciede2000 as _, white_point::D65, Lab};

        if lab1 == lab2 {
            return 0.0;
        }
        let lab1: Lab<D65, f64> = lab1.into();
        let lab2: Lab<D65, f64> = lab2.into();
        lab1.difference(lab2)
    }
}

/// True when the precise backend is compiled in
pub const fn precise_backend_available() -> bool {
    cfg!(feature = "ciede2000")
}

/// Pick the most precise available strategy
pub fn detect_strategy() -> Arc<dyn DeltaEStrategy> {
    #[cfg(feature = "ciede2000")]
    {
        Arc::new(Ciede2000)
    }
    #[cfg(not(feature = "ciede2000"))]
    {
        log::warn!("CIEDE2000 backend not available; Delta E falls back to CIE76");
        Arc::new(Cie76)
    }
}

/// Resolve a configured preference into a strategy
///
/// # Errors
///
/// Returns `InvalidParameter` when CIEDE2000 is requested explicitly but the
/// backend is not compiled in
pub fn select_strategy(preference: DeltaEPreference) -> Result<Arc<dyn DeltaEStrategy>> {
    match preference {
        DeltaEPreference::Auto => Ok(detect_strategy()),
        DeltaEPreference::Cie76 => Ok(Arc::new(Cie76)),
        DeltaEPreference::Ciede2000 => {
            #[cfg(feature = "ciede2000")]
            {
                Ok(Arc::new(Ciede2000))
            }
            #[cfg(not(feature = "ciede2000"))]
            {
                log::warn!("CIEDE2000 requested but the backend is not compiled in");
                Err(crate::LibraryError::invalid_parameter(
                    "delta_e",
                    "ciede2000 (enable the `ciede2000` feature)",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pairs() -> Vec<(LabColor, LabColor)> {
        vec![
            (LabColor::new(50.0, 2.6772, -79.7751), LabColor::new(50.0, 0.0, -82.7485)),
            (LabColor::new(62.0, 70.0, 65.0), LabColor::new(53.24, 80.09, 67.2)),
            (LabColor::new(0.0, 0.0, 0.0), LabColor::new(100.0, 0.0, 0.0)),
            (LabColor::new(35.0, -20.5, 12.25), LabColor::new(36.1, -19.0, 14.0)),
        ]
    }

    #[test]
    fn test_cie76_known_distance() {
        let d = Cie76.delta_e(LabColor::new(50.0, 0.0, 0.0), LabColor::new(53.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cie76_identity_and_symmetry() {
        for (a, b) in sample_pairs() {
            assert_eq!(Cie76.delta_e(a, a), 0.0);
            assert_eq!(Cie76.delta_e(a, b), Cie76.delta_e(b, a));
        }
    }

    #[cfg(feature = "ciede2000")]
    #[test]
    fn test_ciede2000_reference_pair() {
        // First pair of the Sharma, Wu & Dalal test data set
        let d = Ciede2000.delta_e(
            LabColor::new(50.0, 2.6772, -79.7751),
            LabColor::new(50.0, 0.0, -82.7485),
        );
        assert!((d - 2.0425).abs() < 1e-3, "got {d}");
    }

    #[cfg(feature = "ciede2000")]
    #[test]
    fn test_ciede2000_identity_and_symmetry() {
        for (a, b) in sample_pairs() {
            assert_eq!(Ciede2000.delta_e(a, a), 0.0);
            assert_eq!(Ciede2000.delta_e(a, b), Ciede2000.delta_e(b, a));
        }
    }

    #[test]
    fn test_select_strategy() {
        assert_eq!(select_strategy(DeltaEPreference::Cie76).unwrap().method(), DeltaEMethod::Cie76);

        let auto = select_strategy(DeltaEPreference::Auto).unwrap();
        if precise_backend_available() {
            assert_eq!(auto.method(), DeltaEMethod::Ciede2000);
            assert!(select_strategy(DeltaEPreference::Ciede2000).is_ok());
        } else {
            assert_eq!(auto.method(), DeltaEMethod::Cie76);
            assert!(select_strategy(DeltaEPreference::Ciede2000).is_err());
        }
    }

    #[test]
    fn test_preference_deserialization() {
        let pref: DeltaEPreference = serde_json::from_str("\"cie76\"").unwrap();
        assert_eq!(pref, DeltaEPreference::Cie76);
        assert_eq!(DeltaEMethod::Ciede2000.to_string(), "CIEDE2000");
    }
}
