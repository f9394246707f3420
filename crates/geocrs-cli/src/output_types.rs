use geocrs_core::models::Point3d;
use geocrs_georef::HelmertSolution;
use serde::Serialize;

/// Output for parse command
#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub input: String,
    pub canonical: String,
    pub codespace: String,
    pub version: String,
    pub code: String,
    pub opaque: bool,
}

/// Output for lookup command
#[derive(Debug, Serialize)]
pub struct LookupOutput {
    pub id: String,
    pub name: String,
    pub crs_type: String,
    pub store: Option<String>,
    pub codes: Vec<String>,
    pub datum: String,
    pub ellipsoid: String,
    pub projection: Option<String>,
    pub axis_order: Option<String>,
    pub has_height: bool,
}

/// Output for stores command
#[derive(Debug, Serialize)]
pub struct StoresOutput {
    pub stores: Vec<StoreInfo>,
}

#[derive(Debug, Serialize)]
pub struct StoreInfo {
    pub id: String,
    pub location: String,
    pub crs_count: usize,
    pub transformation_count: usize,
    pub preferred_strategy: String,
}

/// Output for transform command
#[derive(Debug, Serialize)]
pub struct TransformOutput {
    pub source: String,
    pub target: String,
    pub steps: Option<Vec<String>>,
    pub points: Vec<Point3d>,
}

/// Output for fit command
#[derive(Debug, Serialize)]
pub struct FitOutput {
    pub kind: String,
    pub points: usize,
    pub rmse: f64,
    pub source_origin: (f64, f64),
    pub source_scale: f64,
    pub x_coefficients: Vec<f64>,
    pub y_coefficients: Vec<f64>,
    pub helmert: Option<HelmertSolution>,
    pub residuals: Vec<(f64, f64)>,
    pub applied: Vec<(f64, f64)>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
