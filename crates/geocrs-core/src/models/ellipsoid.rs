//! Reference ellipsoids

use crate::error::{CrsError, Result};
use crate::models::units::LinearUnit;
use serde::Serialize;

/// An oblate ellipsoid of revolution. Axes are held in metres regardless of the
/// unit it was defined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ellipsoid {
    pub id: String,
    semi_major_axis: f64,
    semi_minor_axis: f64,
    inverse_flattening: f64,
    unit: LinearUnit,
}

impl Ellipsoid {
    /// Define by semi-major axis and inverse flattening. An inverse flattening of
    /// zero describes a sphere.
    pub fn from_inverse_flattening(
        id: impl Into<String>,
        semi_major_axis: f64,
        inverse_flattening: f64,
        unit: LinearUnit,
    ) -> Result<Self> {
        let id = id.into();
        let a = unit.to_metres(semi_major_axis);
        check_axis(&id, "semi_major_axis", a)?;
        if !inverse_flattening.is_finite() || (inverse_flattening != 0.0 && inverse_flattening < 1.0)
        {
            return Err(CrsError::invalid(
                format!("{}.inverse_flattening", id),
                format!("must be 0 (sphere) or >= 1, got {}", inverse_flattening),
            ));
        }
        let b = if inverse_flattening == 0.0 { a } else { a * (1.0 - 1.0 / inverse_flattening) };
        Ok(Self { id, semi_major_axis: a, semi_minor_axis: b, inverse_flattening, unit })
    }

    /// Define by both semi axes
    pub fn from_semi_minor_axis(
        id: impl Into<String>,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        unit: LinearUnit,
    ) -> Result<Self> {
        let id = id.into();
        let a = unit.to_metres(semi_major_axis);
        let b = unit.to_metres(semi_minor_axis);
        check_axis(&id, "semi_major_axis", a)?;
        check_axis(&id, "semi_minor_axis", b)?;
        if b > a {
            return Err(CrsError::invalid(
                format!("{}.semi_minor_axis", id),
                format!("semi-minor axis {} exceeds semi-major axis {}", b, a),
            ));
        }
        let inverse_flattening = if a == b { 0.0 } else { a / (a - b) };
        Ok(Self { id, semi_major_axis: a, semi_minor_axis: b, inverse_flattening, unit })
    }

    /// A sphere of the given radius in metres
    pub fn sphere(id: impl Into<String>, radius: f64) -> Result<Self> {
        Self::from_inverse_flattening(id, radius, 0.0, LinearUnit::Metre)
    }

    pub fn wgs84() -> Self {
        Self::known("WGS84", 6_378_137.0, 298.257_223_563)
    }

    pub fn grs80() -> Self {
        Self::known("GRS80", 6_378_137.0, 298.257_222_101)
    }

    pub fn bessel1841() -> Self {
        Self::known("Bessel1841", 6_377_397.155, 299.152_812_8)
    }

    pub fn international1924() -> Self {
        Self::known("International1924", 6_378_388.0, 297.0)
    }

    pub fn clarke1866() -> Self {
        Self::known("Clarke1866", 6_378_206.4, 294.978_698_2)
    }

    fn known(id: &str, a: f64, inverse_flattening: f64) -> Self {
        Self {
            id: id.to_string(),
            semi_major_axis: a,
            semi_minor_axis: a * (1.0 - 1.0 / inverse_flattening),
            inverse_flattening,
            unit: LinearUnit::Metre,
        }
    }

    /// Semi-major axis in metres
    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    /// Semi-minor axis in metres
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_minor_axis
    }

    /// Inverse flattening, 0 for a sphere
    pub fn inverse_flattening(&self) -> f64 {
        self.inverse_flattening
    }

    /// The unit the ellipsoid was originally defined in
    pub fn unit(&self) -> LinearUnit {
        self.unit
    }

    pub fn flattening(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            0.0
        } else {
            1.0 / self.inverse_flattening
        }
    }

    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        2.0 * f - f * f
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening == 0.0
    }

    /// Same shape, ignoring identifiers
    pub fn same_shape(&self, other: &Ellipsoid) -> bool {
        (self.semi_major_axis - other.semi_major_axis).abs() < 1e-4
            && (self.semi_minor_axis - other.semi_minor_axis).abs() < 1e-4
    }
}

fn check_axis(id: &str, name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CrsError::invalid(
            format!("{}.{}", id, name),
            format!("ellipsoid axis must be positive, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_shape() {
        let e = Ellipsoid::wgs84();
        assert!((e.semi_minor_axis() - 6_356_752.314_245).abs() < 1e-3);
        assert!((e.eccentricity_squared() - 0.006_694_379_990_14).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_axis() {
        assert!(Ellipsoid::from_inverse_flattening("bad", 0.0, 298.0, LinearUnit::Metre).is_err());
        assert!(Ellipsoid::from_inverse_flattening("bad", -1.0, 298.0, LinearUnit::Metre).is_err());
        assert!(Ellipsoid::from_semi_minor_axis("bad", 6_378_137.0, 0.0, LinearUnit::Metre).is_err());
        assert!(Ellipsoid::from_inverse_flattening("nan", f64::NAN, 0.0, LinearUnit::Metre).is_err());
    }

    #[test]
    fn test_rejects_prolate() {
        let result = Ellipsoid::from_semi_minor_axis("prolate", 6_000_000.0, 6_100_000.0, LinearUnit::Metre);
        assert!(result.is_err());
    }

    #[test]
    fn test_semi_minor_definition_matches_flattening() {
        let a = Ellipsoid::from_semi_minor_axis("b", 6_377_397.155, 6_356_078.962_818, LinearUnit::Metre)
            .unwrap();
        assert!((a.inverse_flattening() - 299.152_812_8).abs() < 1e-5);
        assert!(a.same_shape(&Ellipsoid::bessel1841()));
    }

    #[test]
    fn test_units_are_normalized() {
        let e = Ellipsoid::from_inverse_flattening("km", 6378.137, 298.257_223_563, LinearUnit::Kilometre)
            .unwrap();
        assert!((e.semi_major_axis() - 6_378_137.0).abs() < 1e-6);
        assert_eq!(e.unit(), LinearUnit::Kilometre);
    }

    #[test]
    fn test_sphere() {
        let s = Ellipsoid::sphere("sphere", 6_371_000.0).unwrap();
        assert!(s.is_sphere());
        assert_eq!(s.eccentricity(), 0.0);
    }
}
