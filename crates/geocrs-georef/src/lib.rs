//! GeoCRS Georef - Least-squares point fitting for georeferencing
//!
//! Fits Helmert, affine and polynomial transforms to operator-picked control
//! point pairs, and drives the interactive georeferencing workflow.

pub mod fit;
pub mod session;

pub use fit::{fit, ControlPoint, FitKind, FittedTransform, HelmertSolution};
pub use session::{GeoreferencingSession, SessionState};
