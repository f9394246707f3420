use crate::error::{CrsError, Result};
use crate::models::ellipsoid::Ellipsoid;
use crate::models::transformation::HelmertParams;
use crate::models::units::AngularUnit;
use serde::Serialize;

/// Prime meridian, as an offset from Greenwich
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimeMeridian {
    pub id: String,
    longitude: f64,
    unit: AngularUnit,
}

impl PrimeMeridian {
    pub fn new(id: impl Into<String>, longitude: f64, unit: AngularUnit) -> Result<Self> {
        let id = id.into();
        let radians = unit.to_radians(longitude);
        if !radians.is_finite() || radians.abs() > std::f64::consts::PI {
            return Err(CrsError::invalid(
                format!("{}.longitude", id),
                format!("prime meridian must lie within [-180, 180] degrees, got {} {:?}", longitude, unit),
            ));
        }
        Ok(Self { id, longitude, unit })
    }

    pub fn greenwich() -> Self {
        Self { id: "Greenwich".to_string(), longitude: 0.0, unit: AngularUnit::Degree }
    }

    /// Offset from Greenwich in the unit of definition
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn unit(&self) -> AngularUnit {
        self.unit
    }

    pub fn longitude_radians(&self) -> f64 {
        self.unit.to_radians(self.longitude)
    }
}

/// A geodetic datum: ellipsoid, prime meridian and an optional conversion to
/// WGS 84 used when pivoting datum shifts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeodeticDatum {
    pub id: String,
    pub name: String,
    pub ellipsoid: Ellipsoid,
    pub prime_meridian: PrimeMeridian,
    pub to_wgs84: Option<HelmertParams>,
}

impl GeodeticDatum {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ellipsoid: Ellipsoid,
        prime_meridian: PrimeMeridian,
        to_wgs84: Option<HelmertParams>,
    ) -> Self {
        Self { id: id.into(), name: name.into(), ellipsoid, prime_meridian, to_wgs84 }
    }

    /// WGS 84 (EPSG:6326); its conversion to itself is the identity
    pub fn wgs84() -> Self {
        Self::new(
            "epsg:6326",
            "World Geodetic System 1984",
            Ellipsoid::wgs84(),
            PrimeMeridian::greenwich(),
            Some(HelmertParams::identity()),
        )
    }

    /// Two datums are interchangeable if they share an id, or if they have the same
    /// shape, prime meridian and WGS 84 conversion.
    pub fn is_equivalent(&self, other: &GeodeticDatum) -> bool {
        if self.id.eq_ignore_ascii_case(&other.id) {
            return true;
        }
        self.ellipsoid.same_shape(&other.ellipsoid)
            && (self.prime_meridian.longitude_radians() - other.prime_meridian.longitude_radians())
                .abs()
                < 1e-12
            && match (&self.to_wgs84, &other.to_wgs84) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}
