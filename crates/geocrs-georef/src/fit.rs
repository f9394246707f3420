//! Least-squares fitting of control point pairs
//!
//! Source coordinates are centred on their centroid and divided by their
//! largest deviation before the normal equations are formed; the fitted
//! `PolynomialTransform` keeps that normalization, so its coefficients apply
//! to normalized source coordinates.

use geo::Coord;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{PolynomialTransform, Transformation};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative size below which a Cholesky pivot counts as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// A source coordinate and where it should land
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub source: Coord<f64>,
    pub target: Coord<f64>,
}

impl ControlPoint {
    pub fn new(source: impl Into<Coord<f64>>, target: impl Into<Coord<f64>>) -> Self {
        Self { source: source.into(), target: target.into() }
    }

    fn is_finite(&self) -> bool {
        self.source.x.is_finite() && self.source.y.is_finite() && self.target.x.is_finite() && self.target.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// 4-parameter similarity: translation, rotation and one scale
    Helmert,
    /// 6-parameter affine
    Affine,
    /// Bivariate polynomial of order 1 to 4
    Polynomial(u8),
}

impl FitKind {
    /// Parse `helmert`, `affine` or `polynomial`; `order` only matters for
    /// the latter
    pub fn from_name(name: &str, order: u8) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "helmert" | "similarity" => Ok(FitKind::Helmert),
            "affine" => Ok(FitKind::Affine),
            "polynomial" => {
                PolynomialTransform::check_order(order)?;
                Ok(FitKind::Polynomial(order))
            }
            other => Err(CrsError::invalid("fit.kind", format!("unknown fit kind: {}", other))),
        }
    }

    /// Fewest control points that determine the fit
    pub fn min_points(&self) -> usize {
        match self {
            FitKind::Helmert => 2,
            FitKind::Affine => 3,
            FitKind::Polynomial(order) => PolynomialTransform::term_count(*order),
        }
    }
}

impl fmt::Display for FitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitKind::Helmert => write!(f, "Helmert"),
            FitKind::Affine => write!(f, "affine"),
            FitKind::Polynomial(order) => write!(f, "order {} polynomial", order),
        }
    }
}

/// Helmert parameters on raw source coordinates:
/// `target = translation + scale * R(rotation) * source`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HelmertSolution {
    pub translation: (f64, f64),
    pub scale: f64,
    /// Counter-clockwise, radians
    pub rotation: f64,
}

/// Result of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTransform {
    pub kind: FitKind,
    pub coefficients: PolynomialTransform,
    /// `target - fitted(source)` per control point, in input order
    pub residuals: Vec<Coord<f64>>,
    /// Root mean square of the residual lengths
    pub rmse: f64,
}

impl FittedTransform {
    fn new(kind: FitKind, coefficients: PolynomialTransform, points: &[ControlPoint]) -> Self {
        let residuals: Vec<Coord<f64>> = points
            .iter()
            .map(|p| {
                let (x, y) = coefficients.evaluate(p.source.x, p.source.y);
                Coord { x: p.target.x - x, y: p.target.y - y }
            })
            .collect();
        let sum: f64 = residuals.iter().map(|r| r.x * r.x + r.y * r.y).sum();
        let rmse = (sum / residuals.len() as f64).sqrt();
        Self { kind, coefficients, residuals, rmse }
    }

    pub fn apply_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.coefficients.evaluate(coord.x, coord.y);
        Coord { x, y }
    }

    pub fn apply(&self, coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
        coords.iter().map(|c| self.apply_coord(*c)).collect()
    }

    /// Length of each residual vector
    pub fn residual_lengths(&self) -> Vec<f64> {
        self.residuals.iter().map(|r| r.x.hypot(r.y)).collect()
    }

    /// The fit as a chain step
    pub fn to_transformation(&self) -> Transformation {
        Transformation::Polynomial(self.coefficients.clone())
    }

    /// Translation, scale and rotation of a Helmert fit
    pub fn helmert(&self) -> Option<HelmertSolution> {
        if self.kind != FitKind::Helmert {
            return None;
        }
        let (x, y) = (self.coefficients.x_coefficients(), self.coefficients.y_coefficients());
        let (ox, oy) = self.coefficients.source_origin();
        let s = self.coefficients.source_scale();
        let (a, b) = (x[1] / s, y[1] / s);
        Some(HelmertSolution {
            translation: (x[0] - a * ox + b * oy, y[0] - b * ox - a * oy),
            scale: a.hypot(b),
            rotation: b.atan2(a),
        })
    }
}

/// Fit `kind` to the control points by least squares
pub fn fit(points: &[ControlPoint], kind: FitKind) -> Result<FittedTransform> {
    if let FitKind::Polynomial(order) = kind {
        PolynomialTransform::check_order(order)?;
    }
    let required = kind.min_points();
    if points.len() < required {
        return Err(CrsError::InsufficientPoints { kind: kind.to_string(), required, actual: points.len() });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(CrsError::invalid("control_points", format!("point {} has a non-finite coordinate", index)));
    }

    let frame = Frame::of(points)?;
    if kind != FitKind::Helmert {
        frame.check_not_collinear(points)?;
    }

    let coefficients = match kind {
        FitKind::Helmert => solve_helmert(points, &frame)?,
        FitKind::Affine => solve_polynomial(points, &frame, 1)?,
        FitKind::Polynomial(order) => solve_polynomial(points, &frame, order)?,
    };
    let fitted = FittedTransform::new(kind, coefficients, points);
    tracing::debug!(kind = %kind, points = points.len(), rmse = fitted.rmse, "Fitted control points");
    Ok(fitted)
}

/// Normalization of the source coordinates
struct Frame {
    origin: (f64, f64),
    scale: f64,
}

impl Frame {
    fn of(points: &[ControlPoint]) -> Result<Self> {
        let n = points.len() as f64;
        let ox = points.iter().map(|p| p.source.x).sum::<f64>() / n;
        let oy = points.iter().map(|p| p.source.y).sum::<f64>() / n;
        let scale = points
            .iter()
            .map(|p| (p.source.x - ox).abs().max((p.source.y - oy).abs()))
            .fold(0.0, f64::max);
        if scale <= f64::EPSILON * (1.0 + ox.abs().max(oy.abs())) {
            return Err(CrsError::DegenerateControlPoints {
                reason: "all source points coincide".to_string(),
            });
        }
        Ok(Self { origin: (ox, oy), scale })
    }

    fn normalize(&self, c: Coord<f64>) -> (f64, f64) {
        ((c.x - self.origin.0) / self.scale, (c.y - self.origin.1) / self.scale)
    }

    /// The scatter matrix of the normalized points is singular exactly when
    /// they lie on one line
    fn check_not_collinear(&self, points: &[ControlPoint]) -> Result<()> {
        let (mut suu, mut svv, mut suv) = (0.0, 0.0, 0.0);
        for p in points {
            let (u, v) = self.normalize(p.source);
            suu += u * u;
            svv += v * v;
            suv += u * v;
        }
        let trace = suu + svv;
        if suu * svv - suv * suv <= PIVOT_TOLERANCE * trace * trace {
            return Err(CrsError::DegenerateControlPoints { reason: "source points are collinear".to_string() });
        }
        Ok(())
    }
}

fn solve_polynomial(points: &[ControlPoint], frame: &Frame, order: u8) -> Result<PolynomialTransform> {
    let m = PolynomialTransform::term_count(order);
    let rows: Vec<f64> = points
        .iter()
        .flat_map(|p| {
            let (u, v) = frame.normalize(p.source);
            PolynomialTransform::terms(order, u, v)
        })
        .collect();
    let design = DMatrix::from_row_slice(points.len(), m, &rows);
    let xs = DVector::from_iterator(points.len(), points.iter().map(|p| p.target.x));
    let ys = DVector::from_iterator(points.len(), points.iter().map(|p| p.target.y));

    let solved = solve_normal(&design, &[xs, ys])?;
    PolynomialTransform::new(order, frame.origin, frame.scale, solved[0].as_slice().to_vec(), solved[1].as_slice().to_vec())
}

/// Unknowns `[a, b, tx, ty]` with `x' = a u - b v + tx`, `y' = b u + a v + ty`
fn solve_helmert(points: &[ControlPoint], frame: &Frame) -> Result<PolynomialTransform> {
    let n = points.len();
    let mut design = DMatrix::zeros(2 * n, 4);
    let mut observed = DVector::zeros(2 * n);
    for (i, p) in points.iter().enumerate() {
        let (u, v) = frame.normalize(p.source);
        let (rx, ry) = (2 * i, 2 * i + 1);
        design[(rx, 0)] = u;
        design[(rx, 1)] = -v;
        design[(rx, 2)] = 1.0;
        design[(ry, 0)] = v;
        design[(ry, 1)] = u;
        design[(ry, 3)] = 1.0;
        observed[rx] = p.target.x;
        observed[ry] = p.target.y;
    }

    let solved = solve_normal(&design, &[observed])?;
    let (a, b, tx, ty) = (solved[0][0], solved[0][1], solved[0][2], solved[0][3]);
    PolynomialTransform::new(1, frame.origin, frame.scale, vec![tx, a, -b], vec![ty, b, a])
}

/// Solve `AᵀA x = Aᵀb` for every right-hand side through one Cholesky
/// factorization
fn solve_normal(design: &DMatrix<f64>, observations: &[DVector<f64>]) -> Result<Vec<DVector<f64>>> {
    let singular = || CrsError::DegenerateControlPoints {
        reason: "the normal equations are singular for this point configuration".to_string(),
    };

    let transposed = design.transpose();
    let normal = &transposed * design;
    let largest = normal.diagonal().max();
    let cholesky = normal.cholesky().ok_or_else(singular)?;
    let l = cholesky.l();
    if (0..l.nrows()).any(|i| l[(i, i)] * l[(i, i)] <= PIVOT_TOLERANCE * largest) {
        return Err(singular());
    }

    let solutions: Vec<DVector<f64>> = observations.iter().map(|b| cholesky.solve(&(&transposed * b))).collect();
    if solutions.iter().any(|s| s.iter().any(|c| !c.is_finite())) {
        return Err(singular());
    }
    Ok(solutions)
}
