//! Transformation steps
//!
//! A `Transformation` is pure data. Building executable steps (projection
//! engines, loaded grids) and evaluating them on points happens in `geocrs-geo`.

use crate::error::{CrsError, Result};
use crate::models::ellipsoid::Ellipsoid;
use crate::models::projection::Projection;
use serde::{Deserialize, Serialize};

/// Seven-parameter Helmert conversion in the position-vector convention.
///
/// Translations are in metres, rotations in arc-seconds and scale in parts per
/// million. The four-parameter datum form leaves the rotations at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HelmertParams {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    #[serde(default)]
    pub rx: f64,
    #[serde(default)]
    pub ry: f64,
    #[serde(default)]
    pub rz: f64,
    #[serde(default)]
    pub ppm: f64,
}

impl HelmertParams {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn seven_param(dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64, ppm: f64) -> Self {
        Self { dx, dy, dz, rx, ry, rz, ppm }
    }

    pub fn four_param(dx: f64, dy: f64, dz: f64, ppm: f64) -> Self {
        Self { dx, dy, dz, ppm, ..Self::default() }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Whether the rotations are all zero
    pub fn is_four_param(&self) -> bool {
        self.rx == 0.0 && self.ry == 0.0 && self.rz == 0.0
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz, self.ppm];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CrsError::invalid("helmert", "all parameters must be finite"));
        }
        if self.ppm <= -1e6 {
            return Err(CrsError::invalid("helmert.ppm", "scale would collapse coordinates"));
        }
        Ok(())
    }
}

/// Preferred datum-shift strategy of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatumShiftStrategy {
    #[default]
    Helmert,
    Ntv2,
}

impl std::fmt::Display for DatumShiftStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatumShiftStrategy::Helmert => write!(f, "Helmert"),
            DatumShiftStrategy::Ntv2 => write!(f, "NTv2"),
        }
    }
}

impl std::str::FromStr for DatumShiftStrategy {
    type Err = CrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "helmert" => Ok(DatumShiftStrategy::Helmert),
            "ntv2" => Ok(DatumShiftStrategy::Ntv2),
            _ => Err(CrsError::invalid("datum_shift_strategy", format!("unknown strategy: {}", s))),
        }
    }
}

/// Moves coordinates between a CRS's own axis order and units and the
/// normalized form used inside chains (east/north, radians or metres,
/// longitudes relative to Greenwich).
///
/// Forward direction: optionally swap the axes, multiply both horizontal
/// ordinates by `factor`, then add `offset` to the first one. Heights are
/// multiplied by `height_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisUnitTransform {
    pub swap: bool,
    pub factor: f64,
    pub offset: f64,
    pub height_factor: f64,
    pub inverse: bool,
}

impl AxisUnitTransform {
    pub fn new(swap: bool, factor: f64, offset: f64, height_factor: f64) -> Self {
        Self { swap, factor, offset, height_factor, inverse: false }
    }

    pub fn is_noop(&self) -> bool {
        !self.swap && self.factor == 1.0 && self.offset == 0.0 && self.height_factor == 1.0
    }

    pub fn inverted(&self) -> Self {
        Self { inverse: !self.inverse, ..*self }
    }

    pub fn apply(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        if self.inverse {
            let (a, b) = ((x - self.offset) / self.factor, y / self.factor);
            let (a, b) = if self.swap { (b, a) } else { (a, b) };
            (a, b, z / self.height_factor)
        } else {
            let (a, b) = if self.swap { (y, x) } else { (x, y) };
            (a * self.factor + self.offset, b * self.factor, z * self.height_factor)
        }
    }
}

/// Bivariate polynomial mapping of order 1 to 4.
///
/// Source coordinates are normalized as `(x - origin.0) / scale` before the
/// terms are formed. Terms are ordered by total degree, then by the power of y:
/// `1, u, v, u², uv, v², u³, ...`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolynomialTransform {
    order: u8,
    source_origin: (f64, f64),
    source_scale: f64,
    x_coefficients: Vec<f64>,
    y_coefficients: Vec<f64>,
}

impl PolynomialTransform {
    pub const MAX_ORDER: u8 = 4;

    pub fn new(
        order: u8,
        source_origin: (f64, f64),
        source_scale: f64,
        x_coefficients: Vec<f64>,
        y_coefficients: Vec<f64>,
    ) -> Result<Self> {
        Self::check_order(order)?;
        let terms = Self::term_count(order);
        if x_coefficients.len() != terms || y_coefficients.len() != terms {
            return Err(CrsError::invalid(
                "polynomial.coefficients",
                format!(
                    "order {} needs {} coefficients per ordinate, got {} and {}",
                    order,
                    terms,
                    x_coefficients.len(),
                    y_coefficients.len()
                ),
            ));
        }
        if !source_scale.is_finite() || source_scale <= 0.0 {
            return Err(CrsError::invalid(
                "polynomial.source_scale",
                format!("must be positive, got {}", source_scale),
            ));
        }
        if x_coefficients.iter().chain(y_coefficients.iter()).any(|c| !c.is_finite()) {
            return Err(CrsError::invalid("polynomial.coefficients", "coefficients must be finite"));
        }
        Ok(Self { order, source_origin, source_scale, x_coefficients, y_coefficients })
    }

    /// Coefficients applied to raw, un-normalized source coordinates
    pub fn from_raw(order: u8, x_coefficients: Vec<f64>, y_coefficients: Vec<f64>) -> Result<Self> {
        Self::new(order, (0.0, 0.0), 1.0, x_coefficients, y_coefficients)
    }

    pub fn check_order(order: u8) -> Result<()> {
        if order == 0 || order > Self::MAX_ORDER {
            return Err(CrsError::invalid(
                "polynomial.order",
                format!("order must be between 1 and {}, got {}", Self::MAX_ORDER, order),
            ));
        }
        Ok(())
    }

    /// Number of terms per ordinate: (k+1)(k+2)/2
    pub fn term_count(order: u8) -> usize {
        let k = order as usize;
        (k + 1) * (k + 2) / 2
    }

    /// Monomials of (u, v) in coefficient order
    pub fn terms(order: u8, u: f64, v: f64) -> Vec<f64> {
        let mut terms = Vec::with_capacity(Self::term_count(order));
        for degree in 0..=order as i32 {
            for j in 0..=degree {
                terms.push(u.powi(degree - j) * v.powi(j));
            }
        }
        terms
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn source_origin(&self) -> (f64, f64) {
        self.source_origin
    }

    pub fn source_scale(&self) -> f64 {
        self.source_scale
    }

    pub fn x_coefficients(&self) -> &[f64] {
        &self.x_coefficients
    }

    pub fn y_coefficients(&self) -> &[f64] {
        &self.y_coefficients
    }

    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.source_origin.0) / self.source_scale,
            (y - self.source_origin.1) / self.source_scale,
        )
    }

    pub fn evaluate(&self, x: f64, y: f64) -> (f64, f64) {
        let (u, v) = self.normalize(x, y);
        let terms = Self::terms(self.order, u, v);
        let dot = |coefficients: &[f64]| -> f64 {
            coefficients.iter().zip(terms.iter()).map(|(c, t)| c * t).sum()
        };
        (dot(&self.x_coefficients), dot(&self.y_coefficients))
    }

    /// The exact inverse of a first order polynomial. Higher orders have no
    /// closed-form inverse.
    pub fn inverse(&self) -> Result<Self> {
        if self.order != 1 {
            return Err(CrsError::invalid(
                "polynomial.order",
                format!("an order {} polynomial cannot be inverted", self.order),
            ));
        }
        // x' = a0 + a1 u + a2 v, y' = b0 + b1 u + b2 v with u, v normalized
        let (a0, a1, a2) = (self.x_coefficients[0], self.x_coefficients[1], self.x_coefficients[2]);
        let (b0, b1, b2) = (self.y_coefficients[0], self.y_coefficients[1], self.y_coefficients[2]);
        let det = a1 * b2 - a2 * b1;
        if det.abs() < 1e-15 {
            return Err(CrsError::invalid("polynomial", "affine part is singular"));
        }
        let (s, (ox, oy)) = (self.source_scale, self.source_origin);
        // u = ( b2 (x'-a0) - a2 (y'-b0)) / det, x = ox + s u
        let x_coefficients = vec![
            ox + s * (-b2 * a0 + a2 * b0) / det,
            s * b2 / det,
            -s * a2 / det,
        ];
        let y_coefficients = vec![
            oy + s * (b1 * a0 - a1 * b0) / det,
            -s * b1 / det,
            s * a1 / det,
        ];
        Self::from_raw(1, x_coefficients, y_coefficients)
    }
}

/// A transformation between two coordinate spaces.
///
/// `Identity`, `Helmert`, `Ntv2`, `Polynomial` and `Concatenated` are the
/// transformations a store can define. `Projection`, `Geocentric` and
/// `AxisUnit` are the steps the factory inserts around them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Transformation {
    Identity,
    /// Operates on geocentric cartesian coordinates
    Helmert { params: HelmertParams, inverse: bool },
    /// Operates on geographic radians; `grid` names the grid file
    Ntv2 { grid: String, inverse: bool },
    Polynomial(PolynomialTransform),
    Concatenated(Vec<Transformation>),
    /// Forward maps geographic radians to projected metres
    Projection { ellipsoid: Ellipsoid, projection: Projection, inverse: bool },
    /// Forward maps geographic radians and ellipsoidal height to geocentric metres
    Geocentric { ellipsoid: Ellipsoid, inverse: bool },
    AxisUnit(AxisUnitTransform),
}

impl Transformation {
    /// Build a flattened chain, dropping identities and no-op axis steps
    pub fn concatenate(steps: impl IntoIterator<Item = Transformation>) -> Transformation {
        let mut flat = Vec::new();
        for step in steps {
            flatten_into(step, &mut flat);
        }
        match flat.len() {
            0 => Transformation::Identity,
            1 => flat.remove(0),
            _ => Transformation::Concatenated(flat),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(Self::concatenate([self.clone()]), Transformation::Identity)
    }

    /// Number of elementary steps
    pub fn step_count(&self) -> usize {
        match self {
            Transformation::Identity => 0,
            Transformation::Concatenated(steps) => steps.iter().map(|s| s.step_count()).sum(),
            _ => 1,
        }
    }

    /// The transformation in the opposite direction
    pub fn inverse(&self) -> Result<Transformation> {
        Ok(match self {
            Transformation::Identity => Transformation::Identity,
            Transformation::Helmert { params, inverse } => {
                Transformation::Helmert { params: *params, inverse: !inverse }
            }
            Transformation::Ntv2 { grid, inverse } => {
                Transformation::Ntv2 { grid: grid.clone(), inverse: !inverse }
            }
            Transformation::Polynomial(p) => Transformation::Polynomial(p.inverse()?),
            Transformation::Concatenated(steps) => Transformation::Concatenated(
                steps.iter().rev().map(|s| s.inverse()).collect::<Result<Vec<_>>>()?,
            ),
            Transformation::Projection { ellipsoid, projection, inverse } => {
                Transformation::Projection {
                    ellipsoid: ellipsoid.clone(),
                    projection: projection.clone(),
                    inverse: !inverse,
                }
            }
            Transformation::Geocentric { ellipsoid, inverse } => {
                Transformation::Geocentric { ellipsoid: ellipsoid.clone(), inverse: !inverse }
            }
            Transformation::AxisUnit(a) => Transformation::AxisUnit(a.inverted()),
        })
    }

    /// Short name of a single step
    pub fn name(&self) -> String {
        let dir = |inverse: &bool| if *inverse { "inverse " } else { "" };
        match self {
            Transformation::Identity => "identity".to_string(),
            Transformation::Helmert { params, inverse } => {
                let kind = if params.is_four_param() { "4-parameter" } else { "7-parameter" };
                format!("{}{} Helmert", dir(inverse), kind)
            }
            Transformation::Ntv2 { grid, inverse } => format!("{}NTv2 ({})", dir(inverse), grid),
            Transformation::Polynomial(p) => format!("order {} polynomial", p.order()),
            Transformation::Concatenated(steps) => format!("chain of {} steps", steps.len()),
            Transformation::Projection { projection, inverse, .. } => {
                format!("{}{}", dir(inverse), projection.family())
            }
            Transformation::Geocentric { ellipsoid, inverse } => {
                if *inverse {
                    format!("geocentric to geographic ({})", ellipsoid.id)
                } else {
                    format!("geographic to geocentric ({})", ellipsoid.id)
                }
            }
            Transformation::AxisUnit(_) => "axis/unit normalization".to_string(),
        }
    }

    /// Names of every elementary step, in application order
    pub fn describe(&self) -> Vec<String> {
        match self {
            Transformation::Concatenated(steps) => steps.iter().flat_map(|s| s.describe()).collect(),
            Transformation::Identity => vec![],
            other => vec![other.name()],
        }
    }
}

fn flatten_into(step: Transformation, out: &mut Vec<Transformation>) {
    match step {
        Transformation::Identity => {}
        Transformation::AxisUnit(a) if a.is_noop() => {}
        Transformation::Concatenated(inner) => {
            for s in inner {
                flatten_into(s, out);
            }
        }
        other => out.push(other),
    }
}
