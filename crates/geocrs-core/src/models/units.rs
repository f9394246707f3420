use crate::error::{CrsError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Units for angular ordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AngularUnit {
    #[default]
    Degree,
    Radian,
    Grad,
    ArcSecond,
}

impl AngularUnit {
    /// Multiply a value in this unit by the factor to get radians
    pub fn to_radians_factor(&self) -> f64 {
        match self {
            AngularUnit::Degree => PI / 180.0,
            AngularUnit::Radian => 1.0,
            AngularUnit::Grad => PI / 200.0,
            AngularUnit::ArcSecond => PI / (180.0 * 3600.0),
        }
    }

    /// Convert a value in this unit to radians
    pub fn to_radians(&self, value: f64) -> f64 {
        value * self.to_radians_factor()
    }

    /// Convert radians to this unit
    pub fn from_radians(&self, radians: f64) -> f64 {
        radians / self.to_radians_factor()
    }
}

/// Units for linear ordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    #[default]
    Metre,
    Kilometre,
    Foot,
    UsSurveyFoot,
}

impl LinearUnit {
    /// Multiply a value in this unit by the factor to get metres
    pub fn to_metres_factor(&self) -> f64 {
        match self {
            LinearUnit::Metre => 1.0,
            LinearUnit::Kilometre => 1000.0,
            LinearUnit::Foot => 0.3048,
            LinearUnit::UsSurveyFoot => 1200.0 / 3937.0,
        }
    }

    pub fn to_metres(&self, value: f64) -> f64 {
        value * self.to_metres_factor()
    }

    pub fn from_metres(&self, metres: f64) -> f64 {
        metres / self.to_metres_factor()
    }
}

/// Parse an angular unit from its common names
pub fn parse_angular_unit(s: &str) -> Result<AngularUnit> {
    match s.to_lowercase().as_str() {
        "degree" | "degrees" | "deg" => Ok(AngularUnit::Degree),
        "radian" | "radians" | "rad" => Ok(AngularUnit::Radian),
        "grad" | "gon" => Ok(AngularUnit::Grad),
        "arcsecond" | "arc_second" | "arcsec" => Ok(AngularUnit::ArcSecond),
        _ => Err(CrsError::invalid("angular_unit", format!("Unknown angular unit: {}", s))),
    }
}

/// Parse a linear unit from its common names
pub fn parse_linear_unit(s: &str) -> Result<LinearUnit> {
    match s.to_lowercase().as_str() {
        "metre" | "meter" | "metres" | "meters" | "m" => Ok(LinearUnit::Metre),
        "kilometre" | "kilometer" | "km" => Ok(LinearUnit::Kilometre),
        "foot" | "feet" | "ft" => Ok(LinearUnit::Foot),
        "us_survey_foot" | "us-ft" | "ftus" => Ok(LinearUnit::UsSurveyFoot),
        _ => Err(CrsError::invalid("linear_unit", format!("Unknown linear unit: {}", s))),
    }
}
