//! Mercator (1SP)

use super::{adjust_lon, phi_from_ts, tsfn};
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, Mercator};
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct MercatorEngine {
    e: f64,
    ak0: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl MercatorEngine {
    pub fn new(ellipsoid: &Ellipsoid, params: &Mercator) -> Self {
        Self {
            e: ellipsoid.eccentricity(),
            ak0: ellipsoid.semi_major_axis() * params.scale_factor,
            lon0: params.central_meridian.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if (lat.abs() - FRAC_PI_2).abs() < 1e-10 {
            return Err(CrsError::out_of_domain("the poles have no Mercator image"));
        }
        Ok((
            self.false_easting + self.ak0 * adjust_lon(lon - self.lon0),
            self.false_northing - self.ak0 * tsfn(lat, self.e).ln(),
        ))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let ts = (-(y - self.false_northing) / self.ak0).exp();
        let lat = phi_from_ts(ts, self.e)?;
        Ok(((x - self.false_easting) / self.ak0 + self.lon0, lat))
    }
}
