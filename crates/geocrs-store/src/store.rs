//! A single named CRS store
//!
//! Loading checks every record and reference up front so a malformed resource
//! never produces a store. CRS objects themselves are built on first lookup
//! and cached for the lifetime of the store.

use crate::definition::{builtin_ellipsoid, CrsRecord, CrsRecordKind, DirectTransformation, StoreDefinition};
use crate::ports::CrsResource;
use geocrs_core::code::CrsCode;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{
    AxisOrder, CompoundCrs, Crs, CrsIdentifier, CrsKind, DatumShiftStrategy, Ellipsoid, GeocentricCrs, GeodeticDatum,
    GeographicCrs, PrimeMeridian, ProjectedCrs,
};
use geocrs_geo::Ntv2Grid;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A transformation record with its endpoints parsed
#[derive(Debug, Clone)]
pub struct StoreTransformation {
    pub id: String,
    pub source: CrsCode,
    pub target: CrsCode,
    pub transformation: DirectTransformation,
}

#[derive(Debug)]
pub struct CrsStore {
    id: String,
    location: String,
    strategy: DatumShiftStrategy,
    datums: HashMap<String, GeodeticDatum>,
    records: Vec<CrsRecord>,
    index: HashMap<String, usize>,
    cache: RwLock<HashMap<usize, Arc<Crs>>>,
    /// East/north variants handed out by `lookup_with`
    forced: RwLock<HashMap<usize, Arc<Crs>>>,
    transformations: Vec<StoreTransformation>,
    grids: HashMap<String, Arc<Ntv2Grid>>,
}

impl CrsStore {
    /// Load and check a resource. Any failure is reported as `CrsStore`.
    pub fn load(id: &str, resource: &dyn CrsResource) -> Result<Self> {
        let location = resource.location();
        let definition = resource.load().map_err(|e| store_error(id, e))?;
        Self::from_definition(id, location, definition).map_err(|e| store_error(id, e))
    }

    pub fn from_definition(id: &str, location: String, definition: StoreDefinition) -> Result<Self> {
        let mut ellipsoids = HashMap::new();
        for record in &definition.ellipsoids {
            ellipsoids.insert(record.id.to_lowercase(), record.build()?);
        }
        let ellipsoid = |name: &str| -> Result<Ellipsoid> {
            ellipsoids
                .get(&name.to_lowercase())
                .cloned()
                .or_else(|| builtin_ellipsoid(name))
                .ok_or_else(|| CrsError::invalid("ellipsoid", format!("unknown ellipsoid {}", name)))
        };

        let mut datums = HashMap::new();
        for record in &definition.datums {
            let prime_meridian = match &record.prime_meridian {
                Some(pm) => pm.build()?,
                None => PrimeMeridian::greenwich(),
            };
            if let Some(params) = &record.to_wgs84 {
                params.validate()?;
            }
            let datum = GeodeticDatum::new(
                &record.id,
                &record.name,
                ellipsoid(&record.ellipsoid)?,
                prime_meridian,
                record.to_wgs84,
            );
            if datums.insert(record.id.to_lowercase(), datum).is_some() {
                return Err(CrsError::invalid("datum", format!("duplicate datum id {}", record.id)));
            }
        }

        let mut index = HashMap::new();
        for (i, record) in definition.crs.iter().enumerate() {
            if record.codes.is_empty() {
                return Err(CrsError::invalid("crs.codes", format!("CRS '{}' has no codes", record.name)));
            }
            for code in &record.codes {
                if index.insert(CrsCode::parse(code).lookup_key(), i).is_some() {
                    return Err(CrsError::invalid("crs.codes", format!("code {} is defined twice", code)));
                }
            }
        }

        let store = Self {
            id: id.to_string(),
            location,
            strategy: definition.preferred_strategy,
            datums,
            index,
            records: definition.crs,
            cache: RwLock::new(HashMap::new()),
            forced: RwLock::new(HashMap::new()),
            transformations: Vec::new(),
            grids: HashMap::new(),
        };
        for record in &store.records {
            store.check_record(record)?;
        }

        let mut transformations = Vec::new();
        let mut grids = HashMap::new();
        for record in &definition.transformations {
            let (source, target) = (CrsCode::parse(&record.source), CrsCode::parse(&record.target));
            for code in [&source, &target] {
                if !matches!(store.record(code).map(|r| &r.kind), Some(CrsRecordKind::Geographic { .. })) {
                    return Err(CrsError::invalid(
                        "transformation",
                        format!("{} is not a geographic CRS of this store", code),
                    ));
                }
            }
            let transformation = record.kind.build()?;
            if let DirectTransformation::Ntv2 { grid } = &transformation {
                if !grids.contains_key(grid) {
                    let path = match &definition.base_dir {
                        Some(dir) => dir.join(grid),
                        None => grid.into(),
                    };
                    grids.insert(grid.clone(), Arc::new(Ntv2Grid::from_path(&path)?));
                }
            }
            let id = record.id.clone().unwrap_or_else(|| format!("{}->{}", source, target));
            if transformations.iter().any(|t: &StoreTransformation| t.id.eq_ignore_ascii_case(&id)) {
                return Err(CrsError::invalid("transformation.id", format!("transformation id {} is defined twice", id)));
            }
            transformations.push(StoreTransformation { id, source, target, transformation });
        }

        tracing::debug!(
            store = %id,
            crs = store.records.len(),
            transformations = transformations.len(),
            grids = grids.len(),
            "Loaded CRS store"
        );
        Ok(Self { transformations, grids, ..store })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn preferred_strategy(&self) -> DatumShiftStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of CRS objects built so far
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Every code of every CRS, in definition order
    pub fn codes(&self) -> Vec<CrsCode> {
        self.records
            .iter()
            .flat_map(|r| r.codes.iter().map(|c| CrsCode::parse(c)))
            .collect()
    }

    pub fn contains(&self, code: &CrsCode) -> bool {
        self.position(code).is_some()
    }

    pub fn lookup(&self, code: &CrsCode) -> Result<Arc<Crs>> {
        let position = self.position(code).ok_or_else(|| CrsError::UnknownCrs {
            code: code.to_string(),
            store: Some(self.id.clone()),
        })?;
        self.build_cached(position)
    }

    /// Like `lookup`; with `force_east_north` a lat/lon or northing/easting
    /// CRS comes back with its axes swapped to lon/lat or x/y. The variant is
    /// cached apart from the CRS as defined.
    pub fn lookup_with(&self, code: &CrsCode, force_east_north: bool) -> Result<Arc<Crs>> {
        let crs = self.lookup(code)?;
        if !force_east_north || crs.axis_order() != Some(AxisOrder::NorthEast) {
            return Ok(crs);
        }
        let position = self.position(code).ok_or_else(|| CrsError::UnknownCrs {
            code: code.to_string(),
            store: Some(self.id.clone()),
        })?;
        if let Some(forced) = self.forced.read().get(&position) {
            return Ok(Arc::clone(forced));
        }
        let built = Arc::new(crs.force_east_north());
        let mut forced = self.forced.write();
        Ok(Arc::clone(forced.entry(position).or_insert(built)))
    }

    /// Whether `crs` was handed out by this store instance. A CRS kept from
    /// before a reload belongs to the replaced instance, not this one.
    pub fn is_current(&self, crs: &Arc<Crs>) -> bool {
        if crs.store.as_deref() != Some(self.id.as_str()) {
            return false;
        }
        let Some(position) = self.position(crs.identifier.primary()) else {
            return false;
        };
        let same = |cache: &RwLock<HashMap<usize, Arc<Crs>>>| {
            cache.read().get(&position).is_some_and(|c| Arc::ptr_eq(c, crs))
        };
        same(&self.cache) || same(&self.forced)
    }

    pub fn transformations(&self) -> &[StoreTransformation] {
        &self.transformations
    }

    /// A transformation record by id, ignoring case
    pub fn transformation(&self, id: &str) -> Option<&StoreTransformation> {
        self.transformations.iter().find(|t| t.id.eq_ignore_ascii_case(id))
    }

    /// Transformations defined between the two codes, each with whether it
    /// has to be applied in reverse
    pub fn direct_transformations(&self, source: &CrsCode, target: &CrsCode) -> Vec<(&DirectTransformation, bool)> {
        self.transformations
            .iter()
            .filter_map(|t| {
                if self.same_crs(&t.source, source) && self.same_crs(&t.target, target) {
                    Some((&t.transformation, false))
                } else if self.same_crs(&t.source, target) && self.same_crs(&t.target, source) {
                    Some((&t.transformation, true))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn grid(&self, name: &str) -> Option<Arc<Ntv2Grid>> {
        self.grids.get(name).cloned()
    }

    /// Codes naming the same record, so aliases match transformation endpoints
    fn same_crs(&self, a: &CrsCode, b: &CrsCode) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a.equals_code(b),
        }
    }

    fn position(&self, code: &CrsCode) -> Option<usize> {
        let position = *self.index.get(&code.lookup_key())?;
        let record = &self.records[position];
        record
            .codes
            .iter()
            .any(|c| CrsCode::parse(c).equals_code(code))
            .then_some(position)
    }

    fn record(&self, code: &CrsCode) -> Option<&CrsRecord> {
        self.position(code).map(|i| &self.records[i])
    }

    fn datum(&self, id: &str) -> Result<&GeodeticDatum> {
        self.datums
            .get(&id.to_lowercase())
            .ok_or_else(|| CrsError::invalid("datum", format!("unknown datum {}", id)))
    }

    fn check_record(&self, record: &CrsRecord) -> Result<()> {
        match &record.kind {
            CrsRecordKind::Geographic { datum, .. } | CrsRecordKind::Geocentric { datum, .. } => {
                self.datum(datum)?;
            }
            CrsRecordKind::Projected { base, projection, .. } => {
                match self.record(&CrsCode::parse(base)).map(|r| &r.kind) {
                    Some(CrsRecordKind::Geographic { .. }) => {}
                    _ => {
                        return Err(CrsError::invalid(
                            "crs.base",
                            format!("base {} of '{}' is not a geographic CRS of this store", base, record.name),
                        ))
                    }
                }
                projection.validate()?;
            }
            CrsRecordKind::Compound { underlying, default_height, .. } => {
                match self.record(&CrsCode::parse(underlying)).map(|r| &r.kind) {
                    Some(CrsRecordKind::Geographic { .. } | CrsRecordKind::Projected { .. }) => {}
                    _ => {
                        return Err(CrsError::invalid(
                            "crs.underlying",
                            format!("{} of '{}' is not a horizontal CRS of this store", underlying, record.name),
                        ))
                    }
                }
                if !default_height.is_finite() {
                    return Err(CrsError::invalid("crs.default_height", "must be finite"));
                }
            }
        }
        Ok(())
    }

    fn build_cached(&self, position: usize) -> Result<Arc<Crs>> {
        if let Some(crs) = self.cache.read().get(&position) {
            return Ok(Arc::clone(crs));
        }
        let built = Arc::new(self.build(position)?);
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(position).or_insert(built)))
    }

    fn build(&self, position: usize) -> Result<Crs> {
        let record = &self.records[position];
        let codes = record.codes.iter().map(|c| CrsCode::parse(c)).collect();
        let identifier = CrsIdentifier::new(codes, &record.name)?;
        let kind = match &record.kind {
            CrsRecordKind::Geographic { datum, axis_order, unit } => {
                CrsKind::Geographic(GeographicCrs::new(self.datum(datum)?.clone(), *axis_order, *unit))
            }
            CrsRecordKind::Projected { base, projection, unit, axis_order } => {
                let base_code = CrsCode::parse(base);
                let base_crs = self.lookup(&base_code)?;
                let CrsKind::Geographic(geographic) = &base_crs.kind else {
                    return Err(CrsError::invalid("crs.base", format!("{} is not geographic", base)));
                };
                CrsKind::Projected(ProjectedCrs::new(
                    geographic.clone(),
                    Some(base_crs.identifier.primary().clone()),
                    projection.clone(),
                    *unit,
                    *axis_order,
                )?)
            }
            CrsRecordKind::Geocentric { datum, unit } => {
                CrsKind::Geocentric(GeocentricCrs { datum: self.datum(datum)?.clone(), unit: *unit })
            }
            CrsRecordKind::Compound { underlying, height_unit, default_height } => {
                let horizontal = self.lookup(&CrsCode::parse(underlying))?;
                CrsKind::Compound(CompoundCrs {
                    underlying: Box::new((*horizontal).clone()),
                    height_unit: *height_unit,
                    default_height: *default_height,
                })
            }
        };
        Ok(Crs::new(identifier, kind).with_store(&self.id))
    }
}

fn store_error(id: &str, error: CrsError) -> CrsError {
    match error {
        CrsError::CrsStore { reason, .. } => CrsError::CrsStore { store: id.to_string(), reason },
        other => CrsError::CrsStore { store: id.to_string(), reason: other.to_string() },
    }
}
