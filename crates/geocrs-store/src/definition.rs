//! Parsed store records
//!
//! These mirror the TOML layout of a store resource. Records refer to each
//! other by id (ellipsoids, datums) or by CRS code; `CrsStore::load` resolves
//! and checks the references.

use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{
    AngularUnit, AxisOrder, DatumShiftStrategy, Ellipsoid, HelmertParams, LinearUnit, PolynomialTransform,
    PrimeMeridian, Projection,
};
use serde::Deserialize;
use std::path::PathBuf;

/// Everything a store resource yields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreDefinition {
    #[serde(default)]
    pub preferred_strategy: DatumShiftStrategy,
    #[serde(default, rename = "ellipsoid")]
    pub ellipsoids: Vec<EllipsoidRecord>,
    #[serde(default, rename = "datum")]
    pub datums: Vec<DatumRecord>,
    #[serde(default, rename = "crs")]
    pub crs: Vec<CrsRecord>,
    #[serde(default, rename = "transformation")]
    pub transformations: Vec<TransformationRecord>,
    /// Directory that relative grid file paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl StoreDefinition {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CrsError::Serialization(e.to_string()))
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EllipsoidRecord {
    pub id: String,
    pub semi_major_axis: f64,
    pub inverse_flattening: Option<f64>,
    pub semi_minor_axis: Option<f64>,
    #[serde(default)]
    pub unit: LinearUnit,
}

impl EllipsoidRecord {
    pub fn build(&self) -> Result<Ellipsoid> {
        match (self.inverse_flattening, self.semi_minor_axis) {
            (Some(rf), None) => Ellipsoid::from_inverse_flattening(&self.id, self.semi_major_axis, rf, self.unit),
            (None, Some(b)) => Ellipsoid::from_semi_minor_axis(&self.id, self.semi_major_axis, b, self.unit),
            _ => Err(CrsError::invalid(
                format!("{}.shape", self.id),
                "give exactly one of inverse_flattening and semi_minor_axis",
            )),
        }
    }
}

/// Ellipsoids every store may reference without defining them
pub fn builtin_ellipsoid(id: &str) -> Option<Ellipsoid> {
    [
        Ellipsoid::wgs84(),
        Ellipsoid::grs80(),
        Ellipsoid::bessel1841(),
        Ellipsoid::international1924(),
        Ellipsoid::clarke1866(),
    ]
    .into_iter()
    .find(|e| e.id.eq_ignore_ascii_case(id))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimeMeridianRecord {
    pub id: String,
    pub longitude: f64,
    #[serde(default)]
    pub unit: AngularUnit,
}

impl PrimeMeridianRecord {
    pub fn build(&self) -> Result<PrimeMeridian> {
        PrimeMeridian::new(&self.id, self.longitude, self.unit)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatumRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub ellipsoid: String,
    pub prime_meridian: Option<PrimeMeridianRecord>,
    pub to_wgs84: Option<HelmertParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrsRecord {
    pub codes: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: CrsRecordKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrsRecordKind {
    Geographic {
        datum: String,
        #[serde(default)]
        axis_order: AxisOrder,
        #[serde(default)]
        unit: AngularUnit,
    },
    Projected {
        /// Code of a geographic CRS in the same store
        base: String,
        projection: Projection,
        #[serde(default)]
        unit: LinearUnit,
        #[serde(default)]
        axis_order: AxisOrder,
    },
    Geocentric {
        datum: String,
        #[serde(default)]
        unit: LinearUnit,
    },
    Compound {
        /// Code of a geographic or projected CRS in the same store
        underlying: String,
        #[serde(default)]
        height_unit: LinearUnit,
        #[serde(default)]
        default_height: f64,
    },
}

/// A transformation defined directly between two geographic CRSs
#[derive(Debug, Clone, Deserialize)]
pub struct TransformationRecord {
    /// Defaults to `<source>-><target>`
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub kind: TransformationRecordKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformationRecordKind {
    /// Position-vector Helmert between the geocentric frames of both datums
    Helmert { params: HelmertParams },
    Ntv2 { grid_file: String },
    /// Maps source (lon, lat) degrees to target (lon, lat) degrees
    Polynomial {
        order: u8,
        #[serde(default)]
        source_origin: [f64; 2],
        #[serde(default = "unit_scale")]
        source_scale: f64,
        x_coefficients: Vec<f64>,
        y_coefficients: Vec<f64>,
    },
}

fn unit_scale() -> f64 {
    1.0
}

/// A checked store transformation. NTv2 grids are referenced by file name.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectTransformation {
    Helmert(HelmertParams),
    Ntv2 { grid: String },
    Polynomial(PolynomialTransform),
}

impl DirectTransformation {
    pub fn is_ntv2(&self) -> bool {
        matches!(self, DirectTransformation::Ntv2 { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DirectTransformation::Helmert(_) => "helmert",
            DirectTransformation::Ntv2 { .. } => "ntv2",
            DirectTransformation::Polynomial(_) => "polynomial",
        }
    }
}

impl TransformationRecordKind {
    /// Check parameters. NTv2 grids are loaded by the store.
    pub fn build(&self) -> Result<DirectTransformation> {
        match self {
            TransformationRecordKind::Helmert { params } => {
                params.validate()?;
                Ok(DirectTransformation::Helmert(*params))
            }
            TransformationRecordKind::Ntv2 { grid_file } => {
                Ok(DirectTransformation::Ntv2 { grid: grid_file.clone() })
            }
            TransformationRecordKind::Polynomial {
                order,
                source_origin,
                source_scale,
                x_coefficients,
                y_coefficients,
            } => Ok(DirectTransformation::Polynomial(PolynomialTransform::new(
                *order,
                (source_origin[0], source_origin[1]),
                *source_scale,
                x_coefficients.clone(),
                y_coefficients.clone(),
            )?)),
        }
    }
}
