//! Coordinate reference systems as one closed union over their kinds

use crate::code::CrsCode;
use crate::error::{CrsError, Result};
use crate::models::datum::GeodeticDatum;
use crate::models::projection::Projection;
use crate::models::units::{AngularUnit, LinearUnit};
use serde::Serialize;
use std::fmt;

/// Order of the horizontal axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// lon/lat or x/y
    #[default]
    EastNorth,
    /// lat/lon or y/x
    NorthEast,
}

impl AxisOrder {
    pub fn is_swapped(&self) -> bool {
        matches!(self, AxisOrder::NorthEast)
    }
}

/// Codes a CRS is known by, plus a display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsIdentifier {
    codes: Vec<CrsCode>,
    pub name: String,
}

impl CrsIdentifier {
    /// At least one code is required
    pub fn new(codes: Vec<CrsCode>, name: impl Into<String>) -> Result<Self> {
        if codes.is_empty() {
            return Err(CrsError::invalid("identifier.codes", "a CRS needs at least one code"));
        }
        Ok(Self { codes, name: name.into() })
    }

    pub fn single(code: CrsCode, name: impl Into<String>) -> Self {
        Self { codes: vec![code], name: name.into() }
    }

    /// The first code, used as the CRS id
    pub fn primary(&self) -> &CrsCode {
        &self.codes[0]
    }

    pub fn codes(&self) -> &[CrsCode] {
        &self.codes
    }

    pub fn matches(&self, code: &CrsCode) -> bool {
        self.codes.iter().any(|c| c.equals_code(code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicCrs {
    pub datum: GeodeticDatum,
    pub axis_order: AxisOrder,
    pub unit: AngularUnit,
}

impl GeographicCrs {
    pub fn new(datum: GeodeticDatum, axis_order: AxisOrder, unit: AngularUnit) -> Self {
        Self { datum, axis_order, unit }
    }
}

/// A projection over a geographic base. False origin lives in the projection
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedCrs {
    pub base: GeographicCrs,
    pub base_code: Option<CrsCode>,
    projection: Projection,
    pub unit: LinearUnit,
    pub axis_order: AxisOrder,
}

impl ProjectedCrs {
    /// Validates the projection parameters
    pub fn new(
        base: GeographicCrs,
        base_code: Option<CrsCode>,
        projection: Projection,
        unit: LinearUnit,
        axis_order: AxisOrder,
    ) -> Result<Self> {
        projection.validate()?;
        Ok(Self { base, base_code, projection, unit, axis_order })
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocentricCrs {
    pub datum: GeodeticDatum,
    pub unit: LinearUnit,
}

/// A horizontal CRS with an ellipsoidal height carried in `z`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompoundCrs {
    pub underlying: Box<Crs>,
    pub height_unit: LinearUnit,
    pub default_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrsKind {
    Geographic(GeographicCrs),
    Projected(ProjectedCrs),
    Geocentric(GeocentricCrs),
    Compound(CompoundCrs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CrsType {
    Geographic,
    Projected,
    Geocentric,
    Compound,
}

impl fmt::Display for CrsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrsType::Geographic => "geographic",
            CrsType::Projected => "projected",
            CrsType::Geocentric => "geocentric",
            CrsType::Compound => "compound",
        };
        write!(f, "{}", name)
    }
}

/// A coordinate reference system as produced by a store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crs {
    pub identifier: CrsIdentifier,
    /// Id of the store that produced this CRS
    pub store: Option<String>,
    pub kind: CrsKind,
}

impl Crs {
    pub fn new(identifier: CrsIdentifier, kind: CrsKind) -> Self {
        Self { identifier, store: None, kind }
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Canonical form of the primary code
    pub fn id(&self) -> String {
        self.identifier.primary().to_string()
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    pub fn matches(&self, code: &CrsCode) -> bool {
        self.identifier.matches(code)
    }

    pub fn crs_type(&self) -> CrsType {
        match &self.kind {
            CrsKind::Geographic(_) => CrsType::Geographic,
            CrsKind::Projected(_) => CrsType::Projected,
            CrsKind::Geocentric(_) => CrsType::Geocentric,
            CrsKind::Compound(_) => CrsType::Compound,
        }
    }

    pub fn datum(&self) -> &GeodeticDatum {
        match &self.kind {
            CrsKind::Geographic(g) => &g.datum,
            CrsKind::Projected(p) => &p.base.datum,
            CrsKind::Geocentric(g) => &g.datum,
            CrsKind::Compound(c) => c.underlying.datum(),
        }
    }

    /// Whether `z` carries a meaningful height or geocentric ordinate
    pub fn has_height(&self) -> bool {
        matches!(self.kind, CrsKind::Geocentric(_) | CrsKind::Compound(_))
    }

    /// The horizontal CRS, looking through compound wrappers
    pub fn horizontal(&self) -> &Crs {
        match &self.kind {
            CrsKind::Compound(c) => c.underlying.horizontal(),
            _ => self,
        }
    }

    /// Order of the horizontal axes; geocentric CRSs have none
    pub fn axis_order(&self) -> Option<AxisOrder> {
        match &self.kind {
            CrsKind::Geographic(g) => Some(g.axis_order),
            CrsKind::Projected(p) => Some(p.axis_order),
            CrsKind::Geocentric(_) => None,
            CrsKind::Compound(c) => c.underlying.axis_order(),
        }
    }

    /// A copy whose horizontal axes are east/north (lon/lat, x/y)
    pub fn force_east_north(&self) -> Crs {
        let mut forced = self.clone();
        match &mut forced.kind {
            CrsKind::Geographic(g) => g.axis_order = AxisOrder::EastNorth,
            CrsKind::Projected(p) => p.axis_order = AxisOrder::EastNorth,
            CrsKind::Geocentric(_) => {}
            CrsKind::Compound(c) => *c.underlying = c.underlying.force_east_north(),
        }
        forced
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.identifier.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::projection::TransverseMercator;

    fn wgs84() -> Crs {
        let id = CrsIdentifier::new(
            vec![CrsCode::new("4326", "epsg"), CrsCode::parse("CRS:84")],
            "WGS 84",
        )
        .unwrap();
        Crs::new(
            id,
            CrsKind::Geographic(GeographicCrs::new(
                GeodeticDatum::wgs84(),
                AxisOrder::EastNorth,
                AngularUnit::Degree,
            )),
        )
    }

    #[test]
    fn test_matches_any_code() {
        let crs = wgs84();
        assert!(crs.matches(&CrsCode::parse("EPSG:4326")));
        assert!(crs.matches(&CrsCode::parse("urn:ogc:def:crs:EPSG::4326")));
        assert!(crs.matches(&CrsCode::parse("crs:84")));
        assert!(!crs.matches(&CrsCode::parse("EPSG:4258")));
        assert_eq!(crs.id(), "epsg:4326");
    }

    #[test]
    fn test_identifier_needs_a_code() {
        assert!(CrsIdentifier::new(vec![], "nothing").is_err());
    }

    #[test]
    fn test_projected_validates_projection() {
        let base = GeographicCrs::new(GeodeticDatum::wgs84(), AxisOrder::EastNorth, AngularUnit::Degree);
        let bad = Projection::TransverseMercator(TransverseMercator {
            central_meridian: 9.0,
            latitude_of_origin: -90.0,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            false_northing: 0.0,
        });
        let result = ProjectedCrs::new(base, None, bad, LinearUnit::Metre, AxisOrder::EastNorth);
        assert!(matches!(result, Err(CrsError::InvalidParameter { .. })));
    }

    #[test]
    fn test_compound_looks_through() {
        let compound = Crs::new(
            CrsIdentifier::single(CrsCode::new("4979", "epsg"), "WGS 84 3D"),
            CrsKind::Compound(CompoundCrs {
                underlying: Box::new(wgs84()),
                height_unit: LinearUnit::Metre,
                default_height: 0.0,
            }),
        );
        assert!(compound.has_height());
        assert_eq!(compound.crs_type(), CrsType::Compound);
        assert_eq!(compound.horizontal().id(), "epsg:4326");
        assert_eq!(compound.datum().id, "epsg:6326");
    }

    #[test]
    fn test_force_east_north() {
        let mut lat_lon = wgs84();
        if let CrsKind::Geographic(g) = &mut lat_lon.kind {
            g.axis_order = AxisOrder::NorthEast;
        }
        let compound = Crs::new(
            CrsIdentifier::single(CrsCode::new("4979", "epsg"), "WGS 84 3D"),
            CrsKind::Compound(CompoundCrs {
                underlying: Box::new(lat_lon.clone()),
                height_unit: LinearUnit::Metre,
                default_height: 0.0,
            }),
        );
        assert_eq!(compound.axis_order(), Some(AxisOrder::NorthEast));

        let forced = lat_lon.force_east_north();
        assert_eq!(forced.axis_order(), Some(AxisOrder::EastNorth));
        assert_eq!(forced.id(), lat_lon.id());
        assert_ne!(forced, lat_lon);
        assert_eq!(compound.force_east_north().axis_order(), Some(AxisOrder::EastNorth));
    }
}
