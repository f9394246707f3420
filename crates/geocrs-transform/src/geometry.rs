//! Reprojection of `geo` geometries

use crate::chain::TransformationChain;
use geo::{Coord, Geometry, MapCoords};
use geocrs_core::error::Result;
use geocrs_core::models::Point3d;
use std::cell::Cell;

/// Reproject a geometry through a chain, 2-D only
pub fn reproject_geometry(chain: &TransformationChain, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    // If the chain does nothing, no transformation needed
    if chain.is_identity() {
        return Ok(geometry.clone());
    }

    // Coordinates are numbered in visiting order for error reports
    let index = Cell::new(0usize);
    geometry.try_map_coords(|coord: Coord<f64>| {
        let i = index.get();
        index.set(i + 1);
        chain
            .apply(Point3d::new_2d(coord.x, coord.y))
            .map(|p| Coord { x: p.x, y: p.y })
            .map_err(|e| chain.point_error(i, e))
    })
}
