//! NTv2 grid shift files
//!
//! Binary layout: 16-byte records (8-byte key, 8-byte value), an overview
//! header, then per sub-grid a header followed by `GS_COUNT` nodes of four
//! float32 values (latitude shift, longitude shift, and their accuracies).
//! Longitudes are positive west. Both byte orders are accepted.

use geocrs_core::error::{CrsError, Result};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const RECORD: usize = 16;
/// Upper bound on the nodes of one sub-grid
const MAX_NODES: usize = 1 << 26;
const ARC_SECOND: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Resolves grid names referenced by `Transformation::Ntv2` steps
pub trait GridResolver: Send + Sync {
    fn grid(&self, name: &str) -> Result<Arc<Ntv2Grid>>;
}

impl GridResolver for HashMap<String, Arc<Ntv2Grid>> {
    fn grid(&self, name: &str) -> Result<Arc<Ntv2Grid>> {
        self.get(name).cloned().ok_or_else(|| CrsError::out_of_domain(format!("NTv2 grid '{}' is not loaded", name)))
    }
}

/// One rectangular sub-grid. Bounds and increments are in arc-seconds with
/// longitudes positive west, so `west > east`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGrid {
    pub name: String,
    pub parent: String,
    pub south: f64,
    pub north: f64,
    pub east: f64,
    pub west: f64,
    pub lat_inc: f64,
    pub lon_inc: f64,
    /// Row-major from the south-east corner, each row running west:
    /// `[lat_shift, lon_shift, lat_accuracy, lon_accuracy]` in arc-seconds
    pub nodes: Vec<[f32; 4]>,
}

impl SubGrid {
    pub fn rows(&self) -> usize {
        axis_nodes(self.north - self.south, self.lat_inc)
    }

    pub fn cols(&self) -> usize {
        axis_nodes(self.west - self.east, self.lon_inc)
    }

    pub fn is_root(&self) -> bool {
        self.parent.trim().eq_ignore_ascii_case("NONE") || self.parent.trim().is_empty()
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.south, self.north, self.east, self.west, self.lat_inc, self.lon_inc]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.lat_inc <= 0.0 || self.lon_inc <= 0.0 {
            return Err(malformed(format!("sub-grid {} has invalid increments", self.name)));
        }
        if self.north <= self.south || self.west <= self.east {
            return Err(malformed(format!("sub-grid {} has an empty extent", self.name)));
        }
        let (rows, cols) = (self.rows(), self.cols());
        if rows < 2 || cols < 2 {
            return Err(malformed(format!("sub-grid {} needs at least 2x2 nodes", self.name)));
        }
        let needed = rows
            .checked_mul(cols)
            .filter(|n| *n <= MAX_NODES)
            .ok_or_else(|| malformed(format!("sub-grid {} has too many nodes for its increments", self.name)))?;
        if self.nodes.len() != needed {
            return Err(malformed(format!(
                "sub-grid {} declares {} nodes but its extent needs {}",
                self.name,
                self.nodes.len(),
                needed
            )));
        }
        Ok(())
    }

    /// Bilinear interpolation of (lat_shift, lon_shift) at a point inside the extent
    fn interpolate(&self, lon_w: f64, lat: f64) -> (f64, f64) {
        let (rows, cols) = (self.rows(), self.cols());
        let fr = ((lat - self.south) / self.lat_inc).max(0.0);
        let fc = ((lon_w - self.east) / self.lon_inc).max(0.0);
        let r0 = (fr.floor() as usize).min(rows - 2);
        let c0 = (fc.floor() as usize).min(cols - 2);
        let (tr, tc) = (fr - r0 as f64, fc - c0 as f64);

        let node = |r: usize, c: usize| self.nodes[r * cols + c];
        let (n00, n01, n10, n11) = (node(r0, c0), node(r0, c0 + 1), node(r0 + 1, c0), node(r0 + 1, c0 + 1));
        let blend = |k: usize| {
            n00[k] as f64 * (1.0 - tr) * (1.0 - tc)
                + n01[k] as f64 * (1.0 - tr) * tc
                + n10[k] as f64 * tr * (1.0 - tc)
                + n11[k] as f64 * tr * tc
        };
        (blend(0), blend(1))
    }
}

/// Node count along one axis; saturates for degenerate increments
fn axis_nodes(extent: f64, increment: f64) -> usize {
    let steps = (extent / increment).round();
    if steps.is_finite() && steps >= 0.0 && steps < MAX_NODES as f64 {
        steps as usize + 1
    } else {
        usize::MAX
    }
}

type IndexedExtent = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// A loaded NTv2 grid with a spatial index over its sub-grids
pub struct Ntv2Grid {
    name: String,
    source_datum: String,
    target_datum: String,
    subgrids: Vec<SubGrid>,
    depths: Vec<usize>,
    index: RTree<IndexedExtent>,
}

impl fmt::Debug for Ntv2Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ntv2Grid")
            .field("name", &self.name)
            .field("source_datum", &self.source_datum)
            .field("target_datum", &self.target_datum)
            .field("subgrids", &self.subgrids.len())
            .finish()
    }
}

impl Ntv2Grid {
    pub fn new(
        name: impl Into<String>,
        source_datum: impl Into<String>,
        target_datum: impl Into<String>,
        subgrids: Vec<SubGrid>,
    ) -> Result<Self> {
        if subgrids.is_empty() {
            return Err(malformed("grid has no sub-grids"));
        }
        for subgrid in &subgrids {
            subgrid.validate()?;
        }
        let depths = nesting_depths(&subgrids)?;
        let extents = subgrids
            .iter()
            .enumerate()
            .map(|(i, g)| GeomWithData::new(Rectangle::from_corners([g.east, g.south], [g.west, g.north]), i))
            .collect();
        Ok(Self {
            name: name.into(),
            source_datum: source_datum.into(),
            target_datum: target_datum.into(),
            subgrids,
            depths,
            index: RTree::bulk_load(extents),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        Self::from_bytes(name, &bytes)
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        Reader::new(bytes)?.read(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_datum(&self) -> &str {
        &self.source_datum
    }

    pub fn target_datum(&self) -> &str {
        &self.target_datum
    }

    pub fn subgrids(&self) -> &[SubGrid] {
        &self.subgrids
    }

    /// Most nested sub-grid containing the point (arc-seconds, positive west)
    fn locate(&self, lon_w: f64, lat: f64) -> Option<&SubGrid> {
        self.index
            .locate_all_at_point(&[lon_w, lat])
            .max_by_key(|extent| self.depths[extent.data])
            .map(|extent| &self.subgrids[extent.data])
    }

    /// Shift (lon, lat) in radians from the source to the target datum
    pub fn apply(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let lon_w = -lon / ARC_SECOND;
        let lat_s = lat / ARC_SECOND;
        let subgrid = self.locate(lon_w, lat_s).ok_or_else(|| {
            CrsError::out_of_domain(format!(
                "({:.6}, {:.6}) is not covered by NTv2 grid {}",
                lon.to_degrees(),
                lat.to_degrees(),
                self.name
            ))
        })?;
        let (dlat, dlon) = subgrid.interpolate(lon_w, lat_s);
        Ok((lon - dlon * ARC_SECOND, lat + dlat * ARC_SECOND))
    }

    /// Shift from the target back to the source datum by iterating `apply`
    pub fn apply_inverse(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let (mut g_lon, mut g_lat) = (lon, lat);
        for _ in 0..20 {
            let (f_lon, f_lat) = self.apply(g_lon, g_lat)?;
            let (e_lon, e_lat) = (f_lon - lon, f_lat - lat);
            g_lon -= e_lon;
            g_lat -= e_lat;
            if e_lon.abs() < 1e-12 && e_lat.abs() < 1e-12 {
                return Ok((g_lon, g_lat));
            }
        }
        Err(CrsError::out_of_domain(format!("inverse NTv2 shift in {} did not converge", self.name)))
    }

    /// Serialize as a little-endian NTv2 file in arc-seconds
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_int(&mut out, "NUM_OREC", 11);
        put_int(&mut out, "NUM_SREC", 11);
        put_int(&mut out, "NUM_FILE", self.subgrids.len() as i32);
        put_str(&mut out, "GS_TYPE", "SECONDS");
        put_str(&mut out, "VERSION", "NTv2.0");
        put_str(&mut out, "SYSTEM_F", &self.source_datum);
        put_str(&mut out, "SYSTEM_T", &self.target_datum);
        for key in ["MAJOR_F", "MINOR_F", "MAJOR_T", "MINOR_T"] {
            put_f64(&mut out, key, 0.0);
        }
        for g in &self.subgrids {
            put_str(&mut out, "SUB_NAME", &g.name);
            put_str(&mut out, "PARENT", &g.parent);
            put_str(&mut out, "CREATED", "");
            put_str(&mut out, "UPDATED", "");
            put_f64(&mut out, "S_LAT", g.south);
            put_f64(&mut out, "N_LAT", g.north);
            put_f64(&mut out, "E_LONG", g.east);
            put_f64(&mut out, "W_LONG", g.west);
            put_f64(&mut out, "LAT_INC", g.lat_inc);
            put_f64(&mut out, "LONG_INC", g.lon_inc);
            put_int(&mut out, "GS_COUNT", g.nodes.len() as i32);
            for node in &g.nodes {
                for value in node {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        put_str(&mut out, "END", "");
        out
    }
}

fn nesting_depths(subgrids: &[SubGrid]) -> Result<Vec<usize>> {
    let by_name: HashMap<&str, usize> =
        subgrids.iter().enumerate().map(|(i, g)| (g.name.trim(), i)).collect();
    let mut depths = Vec::with_capacity(subgrids.len());
    for g in subgrids {
        let mut depth = 0;
        let mut current = g;
        while !current.is_root() {
            let parent = by_name.get(current.parent.trim()).ok_or_else(|| {
                malformed(format!("sub-grid {} names unknown parent {}", current.name, current.parent))
            })?;
            depth += 1;
            if depth > subgrids.len() {
                return Err(malformed(format!("sub-grid {} has a cyclic parent chain", g.name)));
            }
            current = &subgrids[*parent];
        }
        depths.push(depth);
    }
    Ok(depths)
}

fn malformed(reason: impl fmt::Display) -> CrsError {
    CrsError::Serialization(format!("malformed NTv2 grid: {}", reason))
}

fn key_bytes(key: &str) -> [u8; 8] {
    let mut bytes = [b' '; 8];
    for (slot, b) in bytes.iter_mut().zip(key.bytes()) {
        *slot = b;
    }
    bytes
}

fn put_int(out: &mut Vec<u8>, key: &str, value: i32) {
    out.extend_from_slice(&key_bytes(key));
    out.extend_from_slice(&value.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
}

fn put_f64(out: &mut Vec<u8>, key: &str, value: f64) {
    out.extend_from_slice(&key_bytes(key));
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_str(out: &mut Vec<u8>, key: &str, value: &str) {
    out.extend_from_slice(&key_bytes(key));
    out.extend_from_slice(&key_bytes(value));
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < 11 * RECORD {
            return Err(malformed("file is shorter than the overview header"));
        }
        if &bytes[0..8] != b"NUM_OREC" {
            return Err(malformed("missing NUM_OREC record"));
        }
        let raw = [bytes[8], bytes[9], bytes[10], bytes[11]];
        let little_endian = if i32::from_le_bytes(raw) == 11 {
            true
        } else if i32::from_be_bytes(raw) == 11 {
            false
        } else {
            return Err(malformed("cannot determine byte order"));
        };
        Ok(Self { bytes, pos: 0, little_endian })
    }

    fn record(&mut self) -> Result<(String, [u8; 8])> {
        let end = self.pos + RECORD;
        let chunk = self.bytes.get(self.pos..end).ok_or_else(|| malformed("unexpected end of file"))?;
        self.pos = end;
        let key = String::from_utf8_lossy(&chunk[..8]).trim_end_matches([' ', '\0']).to_string();
        let mut value = [0u8; 8];
        value.copy_from_slice(&chunk[8..]);
        Ok((key, value))
    }

    fn int(&self, value: [u8; 8]) -> i32 {
        let raw = [value[0], value[1], value[2], value[3]];
        if self.little_endian {
            i32::from_le_bytes(raw)
        } else {
            i32::from_be_bytes(raw)
        }
    }

    fn double(&self, value: [u8; 8]) -> f64 {
        if self.little_endian {
            f64::from_le_bytes(value)
        } else {
            f64::from_be_bytes(value)
        }
    }

    fn float(&self, raw: [u8; 4]) -> f32 {
        if self.little_endian {
            f32::from_le_bytes(raw)
        } else {
            f32::from_be_bytes(raw)
        }
    }

    /// Whole records left in the file
    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos) / RECORD
    }

    fn text(value: [u8; 8]) -> String {
        String::from_utf8_lossy(&value).trim_end_matches([' ', '\0']).trim().to_string()
    }

    /// Read `count` header records into a key/value map
    fn header(&mut self, count: usize) -> Result<HashMap<String, [u8; 8]>> {
        let mut map = HashMap::new();
        for _ in 0..count {
            let (key, value) = self.record()?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn read(mut self, name: String) -> Result<Ntv2Grid> {
        let (_, value) = self.record()?;
        let overview_count = self.int(value) as usize;
        let mut overview = self.header(overview_count.saturating_sub(1))?;
        let field = |map: &mut HashMap<String, [u8; 8]>, key: &str| {
            map.remove(key).ok_or_else(|| malformed(format!("missing {} record", key)))
        };

        let sub_header_count = self.int(field(&mut overview, "NUM_SREC")?) as usize;
        let file_count = self.int(field(&mut overview, "NUM_FILE")?);
        if file_count <= 0 {
            return Err(malformed("NUM_FILE must be positive"));
        }
        let units = Self::text(field(&mut overview, "GS_TYPE")?);
        let factor = match units.to_uppercase().as_str() {
            "SECONDS" => 1.0,
            "MINUTES" => 60.0,
            "DEGREES" => 3600.0,
            other => return Err(malformed(format!("unsupported GS_TYPE {}", other))),
        };
        let source_datum = overview.remove("SYSTEM_F").map(Self::text).unwrap_or_default();
        let target_datum = overview.remove("SYSTEM_T").map(Self::text).unwrap_or_default();

        let mut subgrids = Vec::with_capacity((file_count as usize).min(self.remaining()));
        for _ in 0..file_count {
            let mut header = self.header(sub_header_count)?;
            let mut number = |key: &str| -> Result<f64> {
                let value = field(&mut header, key)?;
                Ok(self.double(value) * factor)
            };
            let south = number("S_LAT")?;
            let north = number("N_LAT")?;
            let east = number("E_LONG")?;
            let west = number("W_LONG")?;
            let lat_inc = number("LAT_INC")?;
            let lon_inc = number("LONG_INC")?;
            let count = self.int(field(&mut header, "GS_COUNT")?);
            if count <= 0 {
                return Err(malformed("GS_COUNT must be positive"));
            }
            let sub_name = header.remove("SUB_NAME").map(Self::text).unwrap_or_default();
            if count as usize > self.remaining() {
                return Err(malformed(format!("sub-grid {} is truncated", sub_name)));
            }
            let parent = header.remove("PARENT").map(Self::text).unwrap_or_else(|| "NONE".to_string());

            let mut nodes = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let chunk = self
                    .bytes
                    .get(self.pos..self.pos + RECORD)
                    .ok_or_else(|| malformed(format!("sub-grid {} is truncated", sub_name)))?;
                let mut node = [0f32; 4];
                for (i, slot) in node.iter_mut().enumerate() {
                    let raw = [chunk[4 * i], chunk[4 * i + 1], chunk[4 * i + 2], chunk[4 * i + 3]];
                    *slot = self.float(raw) * factor as f32;
                }
                nodes.push(node);
                self.pos += RECORD;
            }
            subgrids.push(SubGrid { name: sub_name, parent, south, north, east, west, lat_inc, lon_inc, nodes });
        }
        Ntv2Grid::new(name, source_datum, target_datum, subgrids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 degree parent over 5..7E 50..52N with a constant shift, and a nested
    /// child over 5.5..6E 50.5..51N with a different constant shift.
    fn sample() -> Ntv2Grid {
        let parent = SubGrid {
            name: "PARENT".to_string(),
            parent: "NONE".to_string(),
            south: 50.0 * 3600.0,
            north: 52.0 * 3600.0,
            east: -7.0 * 3600.0,
            west: -5.0 * 3600.0,
            lat_inc: 3600.0,
            lon_inc: 3600.0,
            nodes: vec![[1.0, 2.0, 0.0, 0.0]; 9],
        };
        let child = SubGrid {
            name: "CHILD".to_string(),
            parent: "PARENT".to_string(),
            south: 50.5 * 3600.0,
            north: 51.0 * 3600.0,
            east: -6.0 * 3600.0,
            west: -5.5 * 3600.0,
            lat_inc: 900.0,
            lon_inc: 900.0,
            nodes: vec![[3.0, -4.0, 0.0, 0.0]; 9],
        };
        Ntv2Grid::new("sample.gsb", "A", "B", vec![parent, child]).unwrap()
    }

    #[test]
    fn test_nested_subgrid_wins() {
        let grid = sample();
        let (lon, lat) = (5.75_f64.to_radians(), 50.75_f64.to_radians());
        let (slon, slat) = grid.apply(lon, lat).unwrap();
        assert!(((slat - lat) / ARC_SECOND - 3.0).abs() < 1e-9);
        assert!(((slon - lon) / ARC_SECOND - 4.0).abs() < 1e-9);

        let (lon, lat) = (6.5_f64.to_radians(), 51.5_f64.to_radians());
        let (slon, slat) = grid.apply(lon, lat).unwrap();
        assert!(((slat - lat) / ARC_SECOND - 1.0).abs() < 1e-9);
        assert!(((slon - lon) / ARC_SECOND + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_outside_coverage() {
        let result = sample().apply(10.0_f64.to_radians(), 51.0_f64.to_radians());
        assert!(matches!(result, Err(CrsError::OutOfDomain { .. })));
    }

    #[test]
    fn test_bilinear_interpolation() {
        let mut nodes = Vec::new();
        for r in 0..2 {
            for c in 0..2 {
                nodes.push([(r * 2 + c) as f32, 0.0, 0.0, 0.0]);
            }
        }
        let grid = Ntv2Grid::new(
            "ramp",
            "A",
            "B",
            vec![SubGrid {
                name: "RAMP".to_string(),
                parent: "NONE".to_string(),
                south: 0.0,
                north: 3600.0,
                east: 0.0,
                west: 3600.0,
                lat_inc: 3600.0,
                lon_inc: 3600.0,
                nodes,
            }],
        )
        .unwrap();
        // Centre of the cell: mean of 0, 1, 2, 3
        let (_, lat) = grid.apply(-0.5_f64.to_radians(), 0.5_f64.to_radians()).unwrap();
        assert!(((lat - 0.5_f64.to_radians()) / ARC_SECOND - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_shift() {
        let grid = sample();
        let (lon, lat) = (6.2_f64.to_radians(), 51.3_f64.to_radians());
        let (slon, slat) = grid.apply(lon, lat).unwrap();
        let (blon, blat) = grid.apply_inverse(slon, slat).unwrap();
        assert!((blon - lon).abs() < 1e-12);
        assert!((blat - lat).abs() < 1e-12);
    }

    #[test]
    fn test_binary_round_trip_and_big_endian() {
        let grid = sample();
        let bytes = grid.to_bytes();
        let parsed = Ntv2Grid::from_bytes("copy", &bytes).unwrap();
        assert_eq!(parsed.subgrids(), grid.subgrids());
        assert_eq!(parsed.source_datum(), "A");

        // Swap every numeric field to big-endian
        let mut be = bytes.clone();
        let mut pos = 0;
        let header_ints = ["NUM_OREC", "NUM_SREC", "NUM_FILE", "GS_COUNT"];
        let mut remaining_nodes = 0usize;
        while pos < be.len() {
            if remaining_nodes > 0 {
                for i in 0..4 {
                    be[pos + 4 * i..pos + 4 * i + 4].reverse();
                }
                remaining_nodes -= 1;
            } else {
                let key = String::from_utf8_lossy(&bytes[pos..pos + 8]).trim().to_string();
                if header_ints.contains(&key.as_str()) {
                    be[pos + 8..pos + 12].reverse();
                    if key == "GS_COUNT" {
                        remaining_nodes = i32::from_le_bytes([bytes[pos + 8], bytes[pos + 9], bytes[pos + 10], bytes[pos + 11]]) as usize;
                    }
                } else if ["S_LAT", "N_LAT", "E_LONG", "W_LONG", "LAT_INC", "LONG_INC", "MAJOR_F", "MINOR_F", "MAJOR_T", "MINOR_T"]
                    .contains(&key.as_str())
                {
                    be[pos + 8..pos + 16].reverse();
                }
            }
            pos += RECORD;
        }
        let parsed = Ntv2Grid::from_bytes("be", &be).unwrap();
        assert_eq!(parsed.subgrids(), grid.subgrids());
    }

    #[test]
    fn test_truncated_file_rejected() {
        let bytes = sample().to_bytes();
        assert!(Ntv2Grid::from_bytes("cut", &bytes[..bytes.len() - 40]).is_err());
        assert!(Ntv2Grid::from_bytes("tiny", b"NUM_OREC").is_err());
    }

    /// Overwrite the value of the first record named `key`
    fn patch(bytes: &mut [u8], key: &str, value: &[u8]) {
        let pos = (0..bytes.len() / RECORD)
            .map(|i| i * RECORD)
            .find(|&pos| String::from_utf8_lossy(&bytes[pos..pos + 8]).trim() == key)
            .unwrap();
        bytes[pos + 8..pos + 8 + value.len()].copy_from_slice(value);
    }

    #[test]
    fn test_degenerate_increment_rejected() {
        for increment in [1e-300, 0.0, -3600.0, f64::NAN] {
            let mut bytes = sample().to_bytes();
            patch(&mut bytes, "LAT_INC", &increment.to_le_bytes());
            let result = Ntv2Grid::from_bytes("bad-inc", &bytes);
            assert!(matches!(result, Err(CrsError::Serialization(_))), "increment {}", increment);
        }

        let mut wide = sample().subgrids()[0].clone();
        wide.lon_inc = 1e-300;
        assert_eq!(wide.cols(), usize::MAX);
        assert!(Ntv2Grid::new("wide", "A", "B", vec![wide]).is_err());
    }

    #[test]
    fn test_oversized_node_count_rejected() {
        let mut bytes = sample().to_bytes();
        patch(&mut bytes, "GS_COUNT", &i32::MAX.to_le_bytes());
        let result = Ntv2Grid::from_bytes("huge", &bytes);
        assert!(matches!(result, Err(CrsError::Serialization(ref m)) if m.contains("truncated")), "{:?}", result);

        let mut bytes = sample().to_bytes();
        patch(&mut bytes, "NUM_FILE", &i32::MAX.to_le_bytes());
        assert!(matches!(Ntv2Grid::from_bytes("many", &bytes), Err(CrsError::Serialization(_))));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut child = sample().subgrids()[1].clone();
        child.parent = "MISSING".to_string();
        assert!(Ntv2Grid::new("bad", "A", "B", vec![child]).is_err());
    }
}
