//! Oblique Stereographic, double projection through the conformal sphere (EPSG 9809)

use super::adjust_lon;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, Stereographic};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

#[derive(Debug, Clone)]
pub struct StereographicEngine {
    e: f64,
    es: f64,
    /// Radius of the conformal sphere times k0
    rk0: f64,
    n: f64,
    c: f64,
    chi0: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl StereographicEngine {
    pub fn new(ellipsoid: &Ellipsoid, params: &Stereographic) -> Self {
        let a = ellipsoid.semi_major_axis();
        let e = ellipsoid.eccentricity();
        let es = ellipsoid.eccentricity_squared();
        let lat0 = params.latitude_of_origin.to_radians();
        let sin0 = lat0.sin();

        let rho0 = a * (1.0 - es) / (1.0 - es * sin0 * sin0).powf(1.5);
        let nu0 = a / (1.0 - es * sin0 * sin0).sqrt();
        let r = (rho0 * nu0).sqrt();
        let n = (1.0 + es * lat0.cos().powi(4) / (1.0 - es)).sqrt();
        let s1 = (1.0 + sin0) / (1.0 - sin0);
        let s2 = (1.0 - e * sin0) / (1.0 + e * sin0);
        let w1 = (s1 * s2.powf(e)).powf(n);
        let sin_chi00 = (w1 - 1.0) / (w1 + 1.0);
        let c = (n + sin0) * (1.0 - sin_chi00) / ((n - sin0) * (1.0 + sin_chi00));
        let w2 = c * w1;
        let chi0 = ((w2 - 1.0) / (w2 + 1.0)).asin();

        Self {
            e,
            es,
            rk0: r * params.scale_factor,
            n,
            c,
            chi0,
            lon0: params.central_meridian.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }

    fn conformal_latitude(&self, lat: f64) -> f64 {
        if (lat.abs() - FRAC_PI_2).abs() < 1e-12 {
            return lat.signum() * FRAC_PI_2;
        }
        let sin_lat = lat.sin();
        let sa = (1.0 + sin_lat) / (1.0 - sin_lat);
        let sb = (1.0 - self.e * sin_lat) / (1.0 + self.e * sin_lat);
        let w = self.c * (sa * sb.powf(self.e)).powf(self.n);
        ((w - 1.0) / (w + 1.0)).asin()
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let chi = self.conformal_latitude(lat);
        let lam = self.n * adjust_lon(lon - self.lon0);
        let (sin_chi, cos_chi) = chi.sin_cos();
        let (sin_chi0, cos_chi0) = self.chi0.sin_cos();
        let b = 1.0 + sin_chi * sin_chi0 + cos_chi * cos_chi0 * lam.cos();
        if b < 1e-12 {
            return Err(CrsError::out_of_domain(format!(
                "({:.6}, {:.6}) is antipodal to the projection centre",
                lon.to_degrees(),
                lat.to_degrees()
            )));
        }
        Ok((
            self.false_easting + 2.0 * self.rk0 * cos_chi * lam.sin() / b,
            self.false_northing
                + 2.0 * self.rk0 * (sin_chi * cos_chi0 - cos_chi * sin_chi0 * lam.cos()) / b,
        ))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let de = x - self.false_easting;
        let dn = y - self.false_northing;
        let g = 2.0 * self.rk0 * (FRAC_PI_4 - self.chi0 / 2.0).tan();
        let h = 4.0 * self.rk0 * self.chi0.tan() + g;
        let i = (de / (h + dn)).atan();
        let j = (de / (g - dn)).atan() - i;
        let chi = self.chi0 + 2.0 * ((dn - de * (j / 2.0).tan()) / (2.0 * self.rk0)).atan();
        let lam = j + 2.0 * i;
        let lon = lam / self.n + self.lon0;

        if (chi.abs() - FRAC_PI_2).abs() < 1e-12 {
            return Ok((lon, chi.signum() * FRAC_PI_2));
        }
        let sin_chi = chi.sin();
        let psi = 0.5 * ((1.0 + sin_chi) / (self.c * (1.0 - sin_chi))).ln() / self.n;
        let mut phi = 2.0 * psi.exp().atan() - FRAC_PI_2;
        for _ in 0..30 {
            let s = phi.sin();
            let psi_i =
                ((phi / 2.0 + FRAC_PI_4).tan() * ((1.0 - self.e * s) / (1.0 + self.e * s)).powf(self.e / 2.0)).ln();
            let next = phi - (psi_i - psi) * phi.cos() * (1.0 - self.es * s * s) / (1.0 - self.es);
            if (next - phi).abs() < 1e-14 {
                return Ok((lon, next));
            }
            phi = next;
        }
        Err(CrsError::out_of_domain("stereographic latitude iteration did not converge"))
    }
}
