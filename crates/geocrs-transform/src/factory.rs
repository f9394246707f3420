//! Transformation chain resolution
//!
//! Every chain has the shape `source to normalized geographic -> datum shift
//! -> normalized geographic to target`, where normalized geographic means
//! east/north radians with Greenwich longitudes and ellipsoidal height in
//! metres.

use crate::cache::{ChainCache, ChainKey};
use crate::chain::TransformationChain;
use geocrs_core::code::CrsCode;
use geocrs_core::config::EngineSettings;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{
    AxisUnitTransform, Crs, CrsKind, DatumShiftStrategy, GeodeticDatum, HelmertParams, Point3d, Transformation,
};
use geocrs_geo::PreparedTransformation;
use geocrs_store::{CrsRegistry, DirectMatch, DirectTransformation};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TransformationFactory {
    registry: Arc<CrsRegistry>,
    settings: EngineSettings,
    cache: Arc<ChainCache>,
}

impl TransformationFactory {
    /// The factory's cache subscribes to the registry, so removing or
    /// reloading a store drops every chain built from it.
    pub fn new(registry: Arc<CrsRegistry>, settings: EngineSettings) -> Self {
        let cache = Arc::new(ChainCache::new(settings.chain_cache_capacity));
        registry.add_listener(&cache);
        Self { registry, settings, cache }
    }

    pub fn registry(&self) -> &Arc<CrsRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ChainCache {
        &self.cache
    }

    /// Resolve (or fetch from cache) the chain between two CRSs
    pub fn get_transformation(&self, source: &Arc<Crs>, target: &Arc<Crs>) -> Result<Arc<TransformationChain>> {
        let key = ChainKey::new(source, target);
        if let Some(chain) = self.cache.get(&key) {
            debug!(source = %key.source, target = %key.target, "Chain cache hit");
            return Ok(chain);
        }
        debug!(source = %key.source, target = %key.target, "Chain cache miss");

        let epoch = self.cache.epoch();
        let chain = Arc::new(self.resolve(source, target)?);
        debug!(
            source = %key.source,
            target = %key.target,
            steps = ?chain.description,
            "Resolved transformation chain"
        );
        // CRSs kept from before a reload are served but never cached
        if !self.registry.is_current(source) || !self.registry.is_current(target) {
            debug!(source = %key.source, target = %key.target, "CRS predates its store, chain not cached");
            return Ok(chain);
        }
        Ok(self.cache.insert_since(epoch, key, chain))
    }

    /// Look both codes up in the registry, then `get_transformation`
    pub fn get_transformation_by_code(&self, source: &str, target: &str) -> Result<Arc<TransformationChain>> {
        let source = self.registry.lookup(source)?;
        let target = self.registry.lookup(target)?;
        self.get_transformation(&source, &target)
    }

    /// Evaluate a batch with the configured parallel threshold
    pub fn evaluate(&self, chain: &TransformationChain, points: &[Point3d]) -> Result<Vec<Point3d>> {
        chain.evaluate(points, self.settings.parallel_threshold)
    }

    fn resolve(&self, source: &Arc<Crs>, target: &Arc<Crs>) -> Result<TransformationChain> {
        let no_path = |reason: String| CrsError::NoTransformationPath {
            source_crs: source.id(),
            target_crs: target.id(),
            reason,
        };

        if source.as_ref() == target.as_ref() {
            return Ok(TransformationChain::new(
                Arc::clone(source),
                Arc::clone(target),
                Transformation::Identity,
                PreparedTransformation::default(),
                vec![],
            ));
        }

        let (datum_shift, stores) = self.datum_shift(source, target)?;
        let transformation = Transformation::concatenate([
            to_geographic(source),
            datum_shift,
            to_geographic(target).inverse().map_err(|e| no_path(e.to_string()))?,
        ]);
        let prepared = PreparedTransformation::prepare(&transformation, self.registry.as_ref())
            .map_err(|e| no_path(e.to_string()))?;

        Ok(TransformationChain::new(Arc::clone(source), Arc::clone(target), transformation, prepared, stores))
    }

    /// The datum step between the two geographic bases, plus the stores whose
    /// transformation records it uses
    fn datum_shift(&self, source: &Crs, target: &Crs) -> Result<(Transformation, Vec<String>)> {
        let (src, tgt) = (source.datum(), target.datum());
        if src.is_equivalent(tgt) {
            return Ok((Transformation::Identity, vec![]));
        }

        let matches = match (geographic_code(source), geographic_code(target)) {
            (Some(s), Some(t)) => self.registry.direct_transformations(s, t),
            _ => Vec::new(),
        };

        if self.strategy(source, target) == DatumShiftStrategy::Ntv2 {
            if let Some(found) = matches.iter().find(|m| m.transformation.is_ntv2()) {
                if let DirectTransformation::Ntv2 { grid } = &found.transformation {
                    return Ok((
                        Transformation::Ntv2 { grid: grid.clone(), inverse: found.reversed },
                        vec![found.store.clone()],
                    ));
                }
            }
        }

        for found in &matches {
            if let Some(step) = direct_step(found, src, tgt) {
                return Ok((step, vec![found.store.clone()]));
            }
        }

        match (&src.to_wgs84, &tgt.to_wgs84) {
            (Some(to_wgs84), Some(from_wgs84)) => {
                let helmert = |params: HelmertParams, inverse: bool| {
                    if params.is_identity() {
                        Transformation::Identity
                    } else {
                        Transformation::Helmert { params, inverse }
                    }
                };
                Ok((
                    Transformation::concatenate([
                        Transformation::Geocentric { ellipsoid: src.ellipsoid.clone(), inverse: false },
                        helmert(*to_wgs84, false),
                        helmert(*from_wgs84, true),
                        Transformation::Geocentric { ellipsoid: tgt.ellipsoid.clone(), inverse: true },
                    ]),
                    vec![],
                ))
            }
            (None, _) | (_, None) => {
                let missing = if src.to_wgs84.is_none() { src } else { tgt };
                Err(CrsError::NoTransformationPath {
                    source_crs: source.id(),
                    target_crs: target.id(),
                    reason: format!(
                        "datum {} ({}) has no conversion to WGS 84 and no direct transformation is defined",
                        missing.id, missing.name
                    ),
                })
            }
        }
    }

    fn strategy(&self, source: &Crs, target: &Crs) -> DatumShiftStrategy {
        let from_source = self.registry.preferred_strategy(source.store.as_deref());
        let from_target = self.registry.preferred_strategy(target.store.as_deref());
        let strategy = self.settings.datum_shift_tie_break.resolve(from_source, from_target);
        if from_source != from_target {
            warn!(
                source = %source.id(),
                target = %target.id(),
                "Stores prefer {} and {}; using {} ({:?} tie-break)",
                from_source,
                from_target,
                strategy,
                self.settings.datum_shift_tie_break
            );
        }
        strategy
    }
}

impl std::fmt::Debug for TransformationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformationFactory")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("cached_chains", &self.cache.len())
            .finish()
    }
}

/// Steps from a CRS's own coordinates to normalized geographic coordinates
fn to_geographic(crs: &Crs) -> Transformation {
    match &crs.kind {
        CrsKind::Geographic(g) => Transformation::AxisUnit(AxisUnitTransform::new(
            g.axis_order.is_swapped(),
            g.unit.to_radians_factor(),
            g.datum.prime_meridian.longitude_radians(),
            1.0,
        )),
        CrsKind::Projected(p) => Transformation::concatenate([
            Transformation::AxisUnit(AxisUnitTransform::new(
                p.axis_order.is_swapped(),
                p.unit.to_metres_factor(),
                0.0,
                1.0,
            )),
            Transformation::Projection {
                ellipsoid: p.base.datum.ellipsoid.clone(),
                projection: p.projection().clone(),
                inverse: true,
            },
            Transformation::AxisUnit(AxisUnitTransform::new(
                false,
                1.0,
                p.base.datum.prime_meridian.longitude_radians(),
                1.0,
            )),
        ]),
        CrsKind::Geocentric(g) => {
            let factor = g.unit.to_metres_factor();
            Transformation::concatenate([
                Transformation::AxisUnit(AxisUnitTransform::new(false, factor, 0.0, factor)),
                Transformation::Geocentric { ellipsoid: g.datum.ellipsoid.clone(), inverse: true },
            ])
        }
        CrsKind::Compound(c) => Transformation::concatenate([
            Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0, 0.0, c.height_unit.to_metres_factor())),
            to_geographic(&c.underlying),
        ]),
    }
}

/// Code of the geographic CRS a store transformation record would name
fn geographic_code(crs: &Crs) -> Option<&CrsCode> {
    match &crs.kind {
        CrsKind::Geographic(_) => Some(crs.identifier.primary()),
        CrsKind::Projected(p) => p.base_code.as_ref(),
        CrsKind::Compound(c) => geographic_code(&c.underlying),
        CrsKind::Geocentric(_) => None,
    }
}

/// A Helmert or polynomial store record as a datum step. Polynomial records
/// work in degrees; one that cannot be run in the needed direction is skipped.
fn direct_step(found: &DirectMatch, src: &GeodeticDatum, tgt: &GeodeticDatum) -> Option<Transformation> {
    match &found.transformation {
        DirectTransformation::Helmert(params) => Some(Transformation::concatenate([
            Transformation::Geocentric { ellipsoid: src.ellipsoid.clone(), inverse: false },
            Transformation::Helmert { params: *params, inverse: found.reversed },
            Transformation::Geocentric { ellipsoid: tgt.ellipsoid.clone(), inverse: true },
        ])),
        DirectTransformation::Polynomial(poly) => {
            let poly = if found.reversed {
                match poly.inverse() {
                    Ok(inverse) => inverse,
                    Err(e) => {
                        debug!(store = %found.store, "Skipping polynomial record: {}", e);
                        return None;
                    }
                }
            } else {
                poly.clone()
            };
            let degrees = Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0_f64.to_radians(), 0.0, 1.0));
            Some(Transformation::concatenate([
                degrees.inverse().ok()?,
                Transformation::Polynomial(poly),
                degrees,
            ]))
        }
        DirectTransformation::Ntv2 { .. } => None,
    }
}
