//! Fit command implementation

use super::parse_coordinate;
use crate::cli::FitArgs;
use crate::output::OutputWriter;
use crate::output_types::FitOutput;
use anyhow::{bail, Context, Result};
use geo::Coord;
use geocrs_georef::{ControlPoint, FitKind, GeoreferencingSession};
use std::fs;
use std::path::Path;
use tabled::Tabled;

pub fn execute(args: &FitArgs, output: &OutputWriter) -> Result<()> {
    let kind = FitKind::from_name(&args.kind, args.order)?;
    let pairs = read_pairs(&args.pairs)?;

    let mut session = GeoreferencingSession::new(kind);
    for pair in pairs {
        session.add_point(pair);
    }
    let fitted = session.fit()?.clone();

    let extra = args
        .apply
        .iter()
        .map(|text| parse_coordinate(text).map(|(x, y, _)| Coord { x, y }))
        .collect::<Result<Vec<_>>>()?;
    let applied = session.apply(&extra)?;

    let coefficients = &fitted.coefficients;
    if output.is_json() {
        return output.result(FitOutput {
            kind: kind.to_string(),
            points: session.points().len(),
            rmse: fitted.rmse,
            source_origin: coefficients.source_origin(),
            source_scale: coefficients.source_scale(),
            x_coefficients: coefficients.x_coefficients().to_vec(),
            y_coefficients: coefficients.y_coefficients().to_vec(),
            helmert: fitted.helmert(),
            residuals: fitted.residuals.iter().map(|r| (r.x, r.y)).collect(),
            applied: applied.iter().map(|c| (c.x, c.y)).collect(),
        });
    }

    output.section(format!("Fitted {} transform", kind));
    output.kv("Control points", session.points().len());
    output.kv("RMSE", format!("{:.6}", fitted.rmse));

    if let Some(helmert) = fitted.helmert() {
        output.kv("Translation", format!("{:.6}, {:.6}", helmert.translation.0, helmert.translation.1));
        output.kv("Scale", format!("{:.9}", helmert.scale));
        output.kv("Rotation", format!("{:.9} rad", helmert.rotation));
    } else {
        let (ox, oy) = coefficients.source_origin();
        output.kv("Source origin", format!("{:.6}, {:.6}", ox, oy));
        output.kv("Source scale", format!("{:.6}", coefficients.source_scale()));
        output.kv("X coefficients", join(coefficients.x_coefficients()));
        output.kv("Y coefficients", join(coefficients.y_coefficients()));
    }

    #[derive(Tabled)]
    struct ResidualRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "dX")]
        dx: String,
        #[tabled(rename = "dY")]
        dy: String,
    }

    output.section("Residuals");
    let rows: Vec<ResidualRow> = session
        .points()
        .iter()
        .zip(&fitted.residuals)
        .enumerate()
        .map(|(index, (p, r))| ResidualRow {
            index,
            source: format!("{:.3}, {:.3}", p.source.x, p.source.y),
            target: format!("{:.3}, {:.3}", p.target.x, p.target.y),
            dx: format!("{:.6}", r.x),
            dy: format!("{:.6}", r.y),
        })
        .collect();
    output.table(rows);

    if !applied.is_empty() {
        output.section("Applied");
        for (input, result) in extra.iter().zip(&applied) {
            output.kv(format!("{:.6}, {:.6}", input.x, input.y), format!("{:.6}, {:.6}", result.x, result.y));
        }
    }
    Ok(())
}

/// Read `source_x source_y target_x target_y` per line; commas or
/// whitespace separate values, `#` starts a comment
pub(crate) fn read_pairs(path: &Path) -> Result<Vec<ControlPoint>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_pairs(&content).with_context(|| format!("Invalid control point file {}", path.display()))
}

fn parse_pairs(content: &str) -> Result<Vec<ControlPoint>> {
    let mut points = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|v| !v.is_empty())
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("line {}: not a number", number + 1))?;
        match values.as_slice() {
            [sx, sy, tx, ty] => points.push(ControlPoint::new((*sx, *sy), (*tx, *ty))),
            _ => bail!("line {}: expected 4 values, found {}", number + 1, values.len()),
        }
    }
    Ok(points)
}

fn join(values: &[f64]) -> String {
    values.iter().map(|v| format!("{:.9}", v)).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let content = "# source target\n0 0 10 20\n1,0, 12,20\n\n0 1 10 23 # last\n";
        let points = parse_pairs(content).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].source, Coord { x: 1.0, y: 0.0 });
        assert_eq!(points[2].target, Coord { x: 10.0, y: 23.0 });
    }

    #[test]
    fn test_parse_pairs_rejects_short_lines() {
        let err = parse_pairs("0 0 10\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(parse_pairs("0 0 x 1\n").is_err());
    }
}
