//! Transverse Mercator, meridional-arc series form.
//!
//! Accurate to well below a millimetre within 10 degrees of the central
//! meridian; points further out are rejected.

use super::adjust_lon;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, TransverseMercator};
use std::f64::consts::FRAC_PI_2;

/// Largest supported distance from the central meridian, in radians
const MAX_LON_OFFSET: f64 = 10.0 * std::f64::consts::PI / 180.0;

const FC1: f64 = 1.0;
const FC2: f64 = 0.5;
const FC3: f64 = 0.166_666_666_666_666_666_66;
const FC4: f64 = 0.083_333_333_333_333_333_33;
const FC5: f64 = 0.05;
const FC6: f64 = 0.033_333_333_333_333_333_33;
const FC7: f64 = 0.023_809_523_809_523_809_52;
const FC8: f64 = 0.017_857_142_857_142_857_14;

#[derive(Debug, Clone)]
pub struct TransverseMercatorEngine {
    a: f64,
    es: f64,
    esp: f64,
    en: [f64; 5],
    ml0: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl TransverseMercatorEngine {
    pub fn new(ellipsoid: &Ellipsoid, params: &TransverseMercator) -> Self {
        let es = ellipsoid.eccentricity_squared();
        let en = enfn(es);
        let lat0 = params.latitude_of_origin.to_radians();
        Self {
            a: ellipsoid.semi_major_axis(),
            es,
            esp: es / (1.0 - es),
            en,
            ml0: mlfn(lat0, lat0.sin(), lat0.cos(), &en),
            lon0: params.central_meridian.to_radians(),
            k0: params.scale_factor,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let lam = adjust_lon(lon - self.lon0);
        if lam.abs() > MAX_LON_OFFSET + 1e-12 {
            return Err(CrsError::out_of_domain(format!(
                "longitude {:.6} is {:.3} degrees from the central meridian, more than 10",
                lon.to_degrees(),
                lam.to_degrees().abs()
            )));
        }
        let (sinphi, cosphi) = lat.sin_cos();
        let mut t = if cosphi.abs() > 1e-10 { sinphi / cosphi } else { 0.0 };
        t *= t;
        let mut al = cosphi * lam;
        let als = al * al;
        al /= (1.0 - self.es * sinphi * sinphi).sqrt();
        let n = self.esp * cosphi * cosphi;

        let y = self.k0
            * (mlfn(lat, sinphi, cosphi, &self.en) - self.ml0
                + sinphi
                    * al
                    * lam
                    * FC2
                    * (1.0
                        + FC4
                            * als
                            * (5.0 - t
                                + n * (9.0 + 4.0 * n)
                                + FC6
                                    * als
                                    * (61.0
                                        + t * (t - 58.0)
                                        + n * (270.0 - 330.0 * t)
                                        + FC8 * als * (1385.0 + t * (t * (543.0 - t) - 3111.0))))));
        let x = self.k0
            * al
            * (FC1
                + FC3
                    * als
                    * (1.0 - t
                        + n
                        + FC5
                            * als
                            * (5.0
                                + t * (t - 18.0)
                                + n * (14.0 - 58.0 * t)
                                + FC7 * als * (61.0 + t * (t * (179.0 - t) - 479.0)))));

        Ok((self.a * x + self.false_easting, self.a * y + self.false_northing))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let x = (x - self.false_easting) / self.a;
        let y = (y - self.false_northing) / self.a;
        let phi = inv_mlfn(self.ml0 + y / self.k0, self.es, &self.en)?;
        if phi.abs() >= FRAC_PI_2 {
            return Ok((self.lon0, FRAC_PI_2.copysign(y)));
        }
        let (sinphi, cosphi) = phi.sin_cos();
        let mut t = if cosphi.abs() > 1e-10 { sinphi / cosphi } else { 0.0 };
        let n = self.esp * cosphi * cosphi;
        let mut con = 1.0 - self.es * sinphi * sinphi;
        let d = x * con.sqrt() / self.k0;
        con *= t;
        t *= t;
        let ds = d * d;

        let lat = phi
            - (con * ds / (1.0 - self.es))
                * FC2
                * (1.0
                    - ds * FC4
                        * (5.0 + t * (3.0 - 9.0 * n) + n * (1.0 - 4.0 * n)
                            - ds * FC6
                                * (61.0 + t * (90.0 - 252.0 * n + 45.0 * t) + 46.0 * n
                                    - ds * FC8 * (1385.0 + t * (3633.0 + t * (4095.0 + 1574.0 * t))))));
        let lam = d
            * (FC1
                - ds * FC3
                    * (1.0 + 2.0 * t + n
                        - ds * FC5
                            * (5.0 + t * (28.0 + 24.0 * t + 8.0 * n) + 6.0 * n
                                - ds * FC7 * (61.0 + t * (662.0 + t * (1320.0 + 720.0 * t))))))
            / cosphi;

        Ok((lam + self.lon0, lat))
    }
}

/// Coefficients of the meridional arc series
fn enfn(es: f64) -> [f64; 5] {
    const C00: f64 = 1.0;
    const C02: f64 = 0.25;
    const C04: f64 = 0.046875;
    const C06: f64 = 0.01953125;
    const C08: f64 = 0.01068115234375;
    const C22: f64 = 0.75;
    const C44: f64 = 0.46875;
    const C46: f64 = 0.013_020_833_333_333_333_33;
    const C48: f64 = 0.007_120_768_229_166_666_66;
    const C66: f64 = 0.364_583_333_333_333_333_33;
    const C68: f64 = 0.005_696_614_583_333_333_33;
    const C88: f64 = 0.3076171875;

    let mut en = [0.0; 5];
    en[0] = C00 - es * (C02 + es * (C04 + es * (C06 + es * C08)));
    en[1] = es * (C22 - es * (C04 + es * (C06 + es * C08)));
    let mut t = es * es;
    en[2] = t * (C44 - es * (C46 + es * C48));
    t *= es;
    en[3] = t * (C66 - es * C68);
    en[4] = t * es * C88;
    en
}

/// Meridional arc length on the unit ellipsoid
fn mlfn(phi: f64, sphi: f64, cphi: f64, en: &[f64; 5]) -> f64 {
    let c = cphi * sphi;
    let s = sphi * sphi;
    en[0] * phi - c * (en[1] + s * (en[2] + s * (en[3] + s * en[4])))
}

fn inv_mlfn(arg: f64, es: f64, en: &[f64; 5]) -> Result<f64> {
    let k = 1.0 / (1.0 - es);
    let mut phi = arg;
    for _ in 0..10 {
        let s = phi.sin();
        let mut t = 1.0 - es * s * s;
        t = (mlfn(phi, s, phi.cos(), en) - arg) * (t * t.sqrt()) * k;
        phi -= t;
        if t.abs() < 1e-11 {
            return Ok(phi);
        }
    }
    Err(CrsError::out_of_domain("inverse meridional distance did not converge"))
}
