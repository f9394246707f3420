//! GeoCRS Transform - Transformation chains between CRS pairs
//!
//! The factory resolves `inverse projection -> datum shift -> forward
//! projection` chains, caches them per CRS pair, and evaluates them on point
//! batches and `geo` geometries.

pub mod cache;
pub mod chain;
pub mod factory;
pub mod geometry;

pub use cache::{ChainCache, ChainKey};
pub use chain::TransformationChain;
pub use factory::TransformationFactory;
pub use geometry::reproject_geometry;
