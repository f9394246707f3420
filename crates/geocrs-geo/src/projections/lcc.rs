//! Lambert Conformal Conic, one and two standard parallels

use super::{adjust_lon, msfn, phi_from_ts, tsfn};
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, LambertConformalConic};
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct LambertConformalConicEngine {
    a: f64,
    e: f64,
    n: f64,
    /// a * k0 * F
    ak0f: f64,
    rho0: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConicEngine {
    /// Coincident or missing second parallels use the single parallel cone
    pub fn new(ellipsoid: &Ellipsoid, params: &LambertConformalConic) -> Result<Self> {
        let a = ellipsoid.semi_major_axis();
        let es = ellipsoid.eccentricity_squared();
        let e = ellipsoid.eccentricity();
        let phi1 = params.first_parallel.to_radians();
        let lat0 = params.latitude_of_origin.to_radians();

        let n = match params.second_parallel {
            Some(second) if !params.is_single_parallel() => {
                let phi2 = second.to_radians();
                let (m1, m2) = (msfn(phi1, es), msfn(phi2, es));
                let (t1, t2) = (tsfn(phi1, e), tsfn(phi2, e));
                (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
            }
            _ => phi1.sin(),
        };
        if !n.is_finite() || n.abs() < 1e-10 {
            return Err(CrsError::invalid("standard_parallels", "parallels do not define a cone"));
        }

        let f = msfn(phi1, es) / (n * tsfn(phi1, e).powf(n));
        let ak0f = a * params.scale_factor * f;
        let rho0 = rho_at(ak0f, lat0, e, n)?;
        Ok(Self {
            a,
            e,
            n,
            ak0f,
            rho0,
            lon0: params.central_meridian.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        })
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let rho = rho_at(self.ak0f, lat, self.e, self.n)?;
        let theta = self.n * adjust_lon(lon - self.lon0);
        Ok((
            self.false_easting + rho * theta.sin(),
            self.false_northing + self.rho0 - rho * theta.cos(),
        ))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut dx = x - self.false_easting;
        let mut dy = self.rho0 - (y - self.false_northing);
        let rho = dx.hypot(dy).copysign(self.n);
        if self.n < 0.0 {
            dx = -dx;
            dy = -dy;
        }
        let theta = dx.atan2(dy);
        if rho.abs() < 1e-12 * self.a {
            return Ok((self.lon0, FRAC_PI_2.copysign(self.n)));
        }
        let ts = (rho / self.ak0f).powf(1.0 / self.n);
        let lat = phi_from_ts(ts, self.e)?;
        Ok((theta / self.n + self.lon0, lat))
    }
}

fn rho_at(ak0f: f64, lat: f64, e: f64, n: f64) -> Result<f64> {
    // The pole opposite the cone apex maps to infinity
    if lat * n.signum() <= -FRAC_PI_2 + 1e-10 {
        return Err(CrsError::out_of_domain(format!(
            "latitude {:.6} is the pole opposite the cone apex",
            lat.to_degrees()
        )));
    }
    if (lat.abs() - FRAC_PI_2).abs() < 1e-12 {
        return Ok(0.0);
    }
    Ok(ak0f * tsfn(lat, e).powf(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maryland(second: Option<f64>) -> LambertConformalConicEngine {
        LambertConformalConicEngine::new(
            &Ellipsoid::grs80(),
            &LambertConformalConic {
                central_meridian: -77.0,
                latitude_of_origin: 37.666_666_666_666_664,
                first_parallel: 39.45,
                second_parallel: second,
                scale_factor: 1.0,
                false_easting: 400_000.0,
                false_northing: 0.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_reference_point() {
        let (x, y) = maryland(Some(38.3))
            .forward(6.610765_f64.to_radians(), 53.235916_f64.to_radians())
            .unwrap();
        assert!((x - 5_402_441.352_920_79).abs() < 1e-5);
        assert!((y - 4_213_918.862_304_20).abs() < 1e-5);
    }

    #[test]
    fn test_inverse_of_reference_point() {
        let engine = maryland(Some(38.3));
        let (lon, lat) = engine.inverse(5_402_441.352_920_79, 4_213_918.862_304_20).unwrap();
        assert!((lon.to_degrees() - 6.610765).abs() < 1e-8);
        assert!((lat.to_degrees() - 53.235916).abs() < 1e-8);
    }

    #[test]
    fn test_single_parallel_fallback() {
        let single = maryland(None);
        let coincident = maryland(Some(39.45));
        let p = (-76.0_f64.to_radians(), 39.0_f64.to_radians());
        let a = single.forward(p.0, p.1).unwrap();
        let b = coincident.forward(p.0, p.1).unwrap();
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_pole_rejected() {
        let result = maryland(Some(38.3)).forward(0.0, -FRAC_PI_2);
        assert!(matches!(result, Err(CrsError::OutOfDomain { .. })));
    }

    #[test]
    fn test_apex_pole_maps_to_a_point() {
        let engine = maryland(Some(38.3));
        let (x, y) = engine.forward(1.0, FRAC_PI_2).unwrap();
        let (_, lat) = engine.inverse(x, y).unwrap();
        assert!((lat - FRAC_PI_2).abs() < 1e-12);
    }
}
