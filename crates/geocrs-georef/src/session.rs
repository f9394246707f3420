//! Interactive georeferencing workflow
//!
//! `Idle -> CollectingPoints -> Fitted -> Applied`. Editing the control
//! points or the fit kind after a fit discards it and goes back to
//! `CollectingPoints`.

use crate::fit::{fit, ControlPoint, FitKind, FittedTransform};
use geo::Coord;
use geocrs_core::error::{CrsError, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    CollectingPoints,
    Fitted,
    Applied,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::CollectingPoints => "collecting points",
            SessionState::Fitted => "fitted",
            SessionState::Applied => "applied",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct GeoreferencingSession {
    state: SessionState,
    kind: FitKind,
    points: Vec<ControlPoint>,
    fitted: Option<FittedTransform>,
}

impl GeoreferencingSession {
    pub fn new(kind: FitKind) -> Self {
        Self { state: SessionState::Idle, kind, points: Vec::new(), fitted: None }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> FitKind {
        self.kind
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// The current fit, if the session is `Fitted` or `Applied`
    pub fn fitted(&self) -> Option<&FittedTransform> {
        self.fitted.as_ref()
    }

    /// Append a control point; returns its index
    pub fn add_point(&mut self, point: ControlPoint) -> usize {
        self.points.push(point);
        self.discard_fit();
        self.points.len() - 1
    }

    pub fn remove_point(&mut self, index: usize) -> Result<ControlPoint> {
        if self.state == SessionState::Idle {
            return Err(self.invalid("remove a control point"));
        }
        if index >= self.points.len() {
            return Err(CrsError::invalid(
                "index",
                format!("no control point {} (session has {})", index, self.points.len()),
            ));
        }
        let removed = self.points.remove(index);
        self.discard_fit();
        if self.points.is_empty() {
            self.state = SessionState::Idle;
        }
        Ok(removed)
    }

    /// Change the kind of fit; an existing fit is discarded
    pub fn set_kind(&mut self, kind: FitKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        if self.fitted.is_some() {
            self.discard_fit();
        }
    }

    /// Fit the collected points. A failed fit leaves the session collecting.
    pub fn fit(&mut self) -> Result<&FittedTransform> {
        if self.state == SessionState::Idle {
            return Err(self.invalid("fit"));
        }
        match fit(&self.points, self.kind) {
            Ok(fitted) => {
                self.state = SessionState::Fitted;
                Ok(self.fitted.insert(fitted))
            }
            Err(e) => {
                self.discard_fit();
                Err(e)
            }
        }
    }

    /// Map coordinates through the current fit
    pub fn apply(&mut self, coords: &[Coord<f64>]) -> Result<Vec<Coord<f64>>> {
        let output = match &self.fitted {
            Some(fitted) => fitted.apply(coords),
            None => return Err(self.invalid("apply")),
        };
        self.state = SessionState::Applied;
        Ok(output)
    }

    pub fn residuals(&self) -> Result<&[Coord<f64>]> {
        self.fitted
            .as_ref()
            .map(|f| f.residuals.as_slice())
            .ok_or_else(|| self.invalid("read residuals"))
    }

    /// Drop every point and the fit
    pub fn reset(&mut self) {
        self.points.clear();
        self.fitted = None;
        self.state = SessionState::Idle;
    }

    fn discard_fit(&mut self) {
        self.fitted = None;
        self.state = SessionState::CollectingPoints;
    }

    fn invalid(&self, operation: &str) -> CrsError {
        CrsError::InvalidState { operation: operation.to_string(), state: self.state.to_string() }
    }
}
