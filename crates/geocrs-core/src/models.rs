pub mod crs;
pub mod datum;
pub mod ellipsoid;
pub mod point;
pub mod projection;
pub mod transformation;
pub mod units;

pub use crs::{
    AxisOrder, CompoundCrs, Crs, CrsIdentifier, CrsKind, CrsType, GeocentricCrs, GeographicCrs,
    ProjectedCrs,
};
pub use datum::{GeodeticDatum, PrimeMeridian};
pub use ellipsoid::Ellipsoid;
pub use point::Point3d;
pub use projection::{
    LambertAzimuthalEqualArea, LambertConformalConic, Mercator, Projection, Stereographic,
    TransverseMercator,
};
pub use transformation::{
    AxisUnitTransform, DatumShiftStrategy, HelmertParams, PolynomialTransform, Transformation,
};
pub use units::{AngularUnit, LinearUnit};
