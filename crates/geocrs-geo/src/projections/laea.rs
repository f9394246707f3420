//! Lambert Azimuthal Equal Area, ellipsoidal oblique aspect (EPSG 9820)

use super::adjust_lon;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, LambertAzimuthalEqualArea};

#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualAreaEngine {
    e: f64,
    es: f64,
    qp: f64,
    /// Authalic latitude of the origin
    beta0: f64,
    rq: f64,
    d: f64,
    lon0: f64,
    lat0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertAzimuthalEqualAreaEngine {
    pub fn new(ellipsoid: &Ellipsoid, params: &LambertAzimuthalEqualArea) -> Self {
        let a = ellipsoid.semi_major_axis();
        let e = ellipsoid.eccentricity();
        let es = ellipsoid.eccentricity_squared();
        let lat0 = params.latitude_of_origin.to_radians();
        let qp = qsfn(std::f64::consts::FRAC_PI_2, e);
        let beta0 = (qsfn(lat0, e) / qp).clamp(-1.0, 1.0).asin();
        let rq = a * (qp / 2.0).sqrt();
        let sin0 = lat0.sin();
        let d = a * (lat0.cos() / (1.0 - es * sin0 * sin0).sqrt()) / (rq * beta0.cos());
        Self {
            e,
            es,
            qp,
            beta0,
            rq,
            d,
            lon0: params.central_meridian.to_radians(),
            lat0,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let beta = (qsfn(lat, self.e) / self.qp).clamp(-1.0, 1.0).asin();
        let dlon = adjust_lon(lon - self.lon0);
        let (sin_b, cos_b) = beta.sin_cos();
        let (sin_b0, cos_b0) = self.beta0.sin_cos();
        let denom = 1.0 + sin_b0 * sin_b + cos_b0 * cos_b * dlon.cos();
        if denom < 1e-12 {
            return Err(CrsError::out_of_domain(format!(
                "({:.6}, {:.6}) is antipodal to the projection centre",
                lon.to_degrees(),
                lat.to_degrees()
            )));
        }
        let b = self.rq * (2.0 / denom).sqrt();
        Ok((
            self.false_easting + b * self.d * cos_b * dlon.sin(),
            self.false_northing + (b / self.d) * (cos_b0 * sin_b - sin_b0 * cos_b * dlon.cos()),
        ))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;
        let rho = (dx / self.d).hypot(self.d * dy);
        if rho < 1e-9 {
            return Ok((self.lon0, self.lat0));
        }
        let ratio = rho / (2.0 * self.rq);
        if ratio > 1.0 + 1e-12 {
            return Err(CrsError::out_of_domain(format!(
                "({:.3}, {:.3}) lies outside the projected globe",
                x, y
            )));
        }
        let c = 2.0 * ratio.min(1.0).asin();
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_b0, cos_b0) = self.beta0.sin_cos();
        let beta = (cos_c * sin_b0 + self.d * dy * sin_c * cos_b0 / rho).clamp(-1.0, 1.0).asin();
        let lon = self.lon0
            + (dx * sin_c).atan2(self.d * rho * cos_b0 * cos_c - self.d * self.d * dy * sin_b0 * sin_c);
        Ok((lon, self.geodetic_from_authalic(beta)))
    }

    fn geodetic_from_authalic(&self, beta: f64) -> f64 {
        let e2 = self.es;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        beta + (e2 / 3.0 + 31.0 * e4 / 180.0 + 517.0 * e6 / 5040.0) * (2.0 * beta).sin()
            + (23.0 * e4 / 360.0 + 251.0 * e6 / 3780.0) * (4.0 * beta).sin()
            + (761.0 * e6 / 45360.0) * (6.0 * beta).sin()
    }
}

/// q(phi), twice the authalic sine scaled by (1 - e²); 2 sin phi on a sphere
fn qsfn(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    if e < 1e-12 {
        return 2.0 * s;
    }
    let es = e * e;
    let con = e * s;
    (1.0 - es) * (s / (1.0 - con * con) - (1.0 / (2.0 * e)) * ((1.0 - con) / (1.0 + con)).ln())
}
