//! Projection parameter sets, one per projection family.
//!
//! Angles are in decimal degrees, false easting/northing in metres. The math
//! lives in `geocrs-geo`; this module only carries and validates parameters.

use crate::error::{CrsError, Result};
use serde::{Deserialize, Serialize};

/// Projection family with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Projection {
    TransverseMercator(TransverseMercator),
    LambertConformalConic(LambertConformalConic),
    LambertAzimuthalEqualArea(LambertAzimuthalEqualArea),
    Stereographic(Stereographic),
    Mercator(Mercator),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransverseMercator {
    pub central_meridian: f64,
    #[serde(default)]
    pub latitude_of_origin: f64,
    #[serde(default = "unit_scale")]
    pub scale_factor: f64,
    #[serde(default)]
    pub false_easting: f64,
    #[serde(default)]
    pub false_northing: f64,
}

/// Lambert Conformal Conic. With a missing or coincident second parallel the
/// single-parallel (1SP) formulation applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambertConformalConic {
    pub central_meridian: f64,
    pub latitude_of_origin: f64,
    pub first_parallel: f64,
    #[serde(default)]
    pub second_parallel: Option<f64>,
    #[serde(default = "unit_scale")]
    pub scale_factor: f64,
    #[serde(default)]
    pub false_easting: f64,
    #[serde(default)]
    pub false_northing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambertAzimuthalEqualArea {
    pub central_meridian: f64,
    pub latitude_of_origin: f64,
    #[serde(default)]
    pub false_easting: f64,
    #[serde(default)]
    pub false_northing: f64,
}

/// Oblique (double) stereographic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stereographic {
    pub central_meridian: f64,
    pub latitude_of_origin: f64,
    #[serde(default = "unit_scale")]
    pub scale_factor: f64,
    #[serde(default)]
    pub false_easting: f64,
    #[serde(default)]
    pub false_northing: f64,
}

/// Mercator (1SP), latitude of origin on the equator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mercator {
    pub central_meridian: f64,
    #[serde(default = "unit_scale")]
    pub scale_factor: f64,
    #[serde(default)]
    pub false_easting: f64,
    #[serde(default)]
    pub false_northing: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Projection {
    /// Human readable family name
    pub fn family(&self) -> &'static str {
        match self {
            Projection::TransverseMercator(_) => "Transverse Mercator",
            Projection::LambertConformalConic(p) if p.is_single_parallel() => {
                "Lambert Conformal Conic (1SP)"
            }
            Projection::LambertConformalConic(_) => "Lambert Conformal Conic (2SP)",
            Projection::LambertAzimuthalEqualArea(_) => "Lambert Azimuthal Equal Area",
            Projection::Stereographic(_) => "Oblique Stereographic",
            Projection::Mercator(_) => "Mercator (1SP)",
        }
    }

    pub fn central_meridian(&self) -> f64 {
        match self {
            Projection::TransverseMercator(p) => p.central_meridian,
            Projection::LambertConformalConic(p) => p.central_meridian,
            Projection::LambertAzimuthalEqualArea(p) => p.central_meridian,
            Projection::Stereographic(p) => p.central_meridian,
            Projection::Mercator(p) => p.central_meridian,
        }
    }

    pub fn false_origin(&self) -> (f64, f64) {
        match self {
            Projection::TransverseMercator(p) => (p.false_easting, p.false_northing),
            Projection::LambertConformalConic(p) => (p.false_easting, p.false_northing),
            Projection::LambertAzimuthalEqualArea(p) => (p.false_easting, p.false_northing),
            Projection::Stereographic(p) => (p.false_easting, p.false_northing),
            Projection::Mercator(p) => (p.false_easting, p.false_northing),
        }
    }

    /// Check every parameter against the family's domain. Latitudes of origin and
    /// standard parallels must lie strictly within (-90, 90).
    pub fn validate(&self) -> Result<()> {
        let (fe, fn_) = self.false_origin();
        check_finite("false_easting", fe)?;
        check_finite("false_northing", fn_)?;
        check_longitude("central_meridian", self.central_meridian())?;
        match self {
            Projection::TransverseMercator(p) => {
                check_latitude("latitude_of_origin", p.latitude_of_origin)?;
                check_scale(p.scale_factor)
            }
            Projection::LambertConformalConic(p) => {
                check_latitude("latitude_of_origin", p.latitude_of_origin)?;
                check_latitude("first_parallel", p.first_parallel)?;
                if let Some(second) = p.second_parallel {
                    check_latitude("second_parallel", second)?;
                    if (p.first_parallel + second).abs() < 1e-10
                        && (p.first_parallel - second).abs() > 1e-10
                    {
                        return Err(CrsError::invalid(
                            "second_parallel",
                            "standard parallels symmetric about the equator do not define a cone",
                        ));
                    }
                }
                if p.is_single_parallel() && p.first_parallel.abs() < 1e-10 {
                    return Err(CrsError::invalid(
                        "first_parallel",
                        "a single standard parallel on the equator does not define a cone",
                    ));
                }
                check_scale(p.scale_factor)
            }
            Projection::LambertAzimuthalEqualArea(p) => {
                check_latitude("latitude_of_origin", p.latitude_of_origin)
            }
            Projection::Stereographic(p) => {
                check_latitude("latitude_of_origin", p.latitude_of_origin)?;
                check_scale(p.scale_factor)
            }
            Projection::Mercator(p) => check_scale(p.scale_factor),
        }
    }
}

impl LambertConformalConic {
    /// Whether the single-parallel formulation applies
    pub fn is_single_parallel(&self) -> bool {
        match self.second_parallel {
            None => true,
            Some(second) => (self.first_parallel - second).abs() < 1e-10,
        }
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CrsError::invalid(name, format!("must be finite, got {}", value)));
    }
    Ok(())
}

fn check_latitude(name: &str, degrees: f64) -> Result<()> {
    check_finite(name, degrees)?;
    if degrees <= -90.0 || degrees >= 90.0 {
        return Err(CrsError::invalid(
            name,
            format!("latitude must lie strictly within (-90, 90) degrees, got {}", degrees),
        ));
    }
    Ok(())
}

fn check_longitude(name: &str, degrees: f64) -> Result<()> {
    check_finite(name, degrees)?;
    if !(-180.0..=180.0).contains(&degrees) {
        return Err(CrsError::invalid(
            name,
            format!("longitude must lie within [-180, 180] degrees, got {}", degrees),
        ));
    }
    Ok(())
}

fn check_scale(scale: f64) -> Result<()> {
    check_finite("scale_factor", scale)?;
    if scale <= 0.0 {
        return Err(CrsError::invalid("scale_factor", format!("must be positive, got {}", scale)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcc(first: f64, second: Option<f64>) -> Projection {
        Projection::LambertConformalConic(LambertConformalConic {
            central_meridian: -77.0,
            latitude_of_origin: 37.0,
            first_parallel: first,
            second_parallel: second,
            scale_factor: 1.0,
            false_easting: 400_000.0,
            false_northing: 0.0,
        })
    }

    #[test]
    fn test_polar_origin_rejected() {
        let tm = Projection::TransverseMercator(TransverseMercator {
            central_meridian: 9.0,
            latitude_of_origin: 90.0,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            false_northing: 0.0,
        });
        assert!(tm.validate().is_err());
    }

    #[test]
    fn test_lcc_parallels() {
        assert!(lcc(39.45, Some(38.3)).validate().is_ok());
        assert!(lcc(-90.0, Some(38.3)).validate().is_err());
        assert!(lcc(30.0, Some(-30.0)).validate().is_err());
        assert!(lcc(0.0, None).validate().is_err());
    }

    #[test]
    fn test_lcc_degenerate_parallels_fall_back_to_single() {
        assert_eq!(lcc(45.0, Some(45.0)).family(), "Lambert Conformal Conic (1SP)");
        assert_eq!(lcc(45.0, None).family(), "Lambert Conformal Conic (1SP)");
        assert_eq!(lcc(45.0, Some(40.0)).family(), "Lambert Conformal Conic (2SP)");
    }

    #[test]
    fn test_scale_must_be_positive() {
        let merc = Projection::Mercator(Mercator {
            central_meridian: 110.0,
            scale_factor: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
        });
        assert!(merc.validate().is_err());
    }

    #[test]
    fn test_deserialize_tagged_family() {
        let toml_src = r#"
family = "transverse_mercator"
central_meridian = 9.0
scale_factor = 0.9996
false_easting = 500000.0
"#;
        let projection: Projection = toml::from_str(toml_src).unwrap();
        match projection {
            Projection::TransverseMercator(tm) => {
                assert_eq!(tm.central_meridian, 9.0);
                assert_eq!(tm.latitude_of_origin, 0.0);
                assert_eq!(tm.false_northing, 0.0);
            }
            other => panic!("unexpected family {:?}", other),
        }
    }
}
