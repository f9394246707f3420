//! Geographic to geocentric (earth-centred, earth-fixed) conversion

use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::Ellipsoid;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// (lon, lat) in radians and ellipsoidal height in metres to cartesian metres
pub fn to_geocentric(ellipsoid: &Ellipsoid, lon: f64, lat: f64, h: f64) -> Result<(f64, f64, f64)> {
    if lat.abs() > FRAC_PI_2 + 1e-12 || !lon.is_finite() || !lat.is_finite() || !h.is_finite() {
        return Err(CrsError::out_of_domain(format!(
            "invalid geographic coordinate ({}, {}, {})",
            lon, lat, h
        )));
    }
    let a = ellipsoid.semi_major_axis();
    let es = ellipsoid.eccentricity_squared();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let nu = a / (1.0 - es * sin_lat * sin_lat).sqrt();
    Ok((
        (nu + h) * cos_lat * lon.cos(),
        (nu + h) * cos_lat * lon.sin(),
        (nu * (1.0 - es) + h) * sin_lat,
    ))
}

/// Cartesian metres to (lon, lat) in radians and ellipsoidal height in metres
pub fn from_geocentric(ellipsoid: &Ellipsoid, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
    if !x.is_finite() || !y.is_finite() || !z.is_finite() {
        return Err(CrsError::out_of_domain(format!("invalid geocentric coordinate ({}, {}, {})", x, y, z)));
    }
    let a = ellipsoid.semi_major_axis();
    let b = ellipsoid.semi_minor_axis();
    let es = ellipsoid.eccentricity_squared();
    let p = x.hypot(y);

    // On the polar axis
    if p < 1e-9 {
        if z.abs() < 1e-9 {
            return Err(CrsError::out_of_domain("the geocentre has no geographic position"));
        }
        return Ok((0.0, FRAC_PI_2.copysign(z), z.abs() - b));
    }

    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - es));
    for _ in 0..30 {
        let sin_lat = lat.sin();
        let nu = a / (1.0 - es * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - nu;
        let next = z.atan2(p * (1.0 - es * nu / (nu + h)));
        let done = (next - lat).abs() < 1e-14;
        lat = next;
        if done {
            break;
        }
    }
    let sin_lat = lat.sin();
    let nu = a / (1.0 - es * sin_lat * sin_lat).sqrt();
    let h = if lat.abs() < FRAC_PI_4 {
        p / lat.cos() - nu
    } else {
        z / sin_lat - nu * (1.0 - es)
    };
    Ok((lon, lat, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let e = Ellipsoid::bessel1841();
        for (lon, lat, h) in [(8.83, 54.9, 0.0), (-120.0, -33.5, 1500.0), (179.9, 89.9, -30.0), (0.0, 0.0, 0.0)] {
            let (x, y, z) = to_geocentric(&e, f64::to_radians(lon), f64::to_radians(lat), h).unwrap();
            let (lon2, lat2, h2) = from_geocentric(&e, x, y, z).unwrap();
            assert!((lon2.to_degrees() - lon).abs() < 1e-10);
            assert!((lat2.to_degrees() - lat).abs() < 1e-10);
            assert!((h2 - h).abs() < 1e-6);
        }
    }

    #[test]
    fn test_equator_on_prime_meridian() {
        let (x, y, z) = to_geocentric(&Ellipsoid::wgs84(), 0.0, 0.0, 0.0).unwrap();
        assert!((x - 6_378_137.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9 && z.abs() < 1e-9);
    }

    #[test]
    fn test_pole() {
        let e = Ellipsoid::wgs84();
        let (_, lat, h) = from_geocentric(&e, 0.0, 0.0, e.semi_minor_axis() + 10.0).unwrap();
        assert!((lat - FRAC_PI_2).abs() < 1e-15);
        assert!((h - 10.0).abs() < 1e-9);
        assert!(from_geocentric(&e, 0.0, 0.0, 0.0).is_err());
    }
}
