//! Transform command implementation

use super::parse_coordinate;
use crate::cli::{Cli, TransformArgs};
use crate::config_loader::{build_factory, load_config};
use crate::output::OutputWriter;
use crate::output_types::TransformOutput;
use anyhow::Result;
use geocrs_core::models::{Crs, CrsKind, Point3d};
use tabled::Tabled;
use tracing::debug;

pub fn execute(cli: &Cli, args: &TransformArgs, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let factory = build_factory(cli, &config)?;

    let registry = factory.registry();
    let source = registry.lookup_with(&args.from, args.force_xy)?;
    let target = registry.lookup_with(&args.to, args.force_xy)?;
    let chain = factory.get_transformation(&source, &target)?;

    let points = args
        .points
        .iter()
        .map(|text| parse_coordinate(text).map(|(x, y, z)| input_point(&source, x, y, z)))
        .collect::<Result<Vec<_>>>()?;
    debug!("Transforming {} point(s) with {}", points.len(), chain.description.join(" -> "));
    let transformed = factory.evaluate(&chain, &points)?;

    if output.is_json() {
        return output.result(TransformOutput {
            source: chain.source.id(),
            target: chain.target.id(),
            steps: args.explain.then(|| chain.description.clone()),
            points: transformed,
        });
    }

    output.section(format!("{} -> {}", chain.source, chain.target));

    if args.explain {
        if chain.is_identity() {
            output.info("Identity: source and target are the same CRS");
        } else {
            for (i, step) in chain.description.iter().enumerate() {
                output.kv(format!("Step {}", i + 1), step);
            }
        }
    }

    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Input")]
        input: String,
        #[tabled(rename = "Output")]
        output: String,
    }

    let show_height = chain.source.has_height() || chain.target.has_height();
    let rows: Vec<PointRow> = points
        .iter()
        .zip(&transformed)
        .enumerate()
        .map(|(index, (input, result))| PointRow {
            index,
            input: format_point(input, show_height),
            output: format_point(result, show_height),
        })
        .collect();
    output.table(rows);
    Ok(())
}

/// A missing height is left unset for compound sources so the chain fills in
/// their default height
fn input_point(source: &Crs, x: f64, y: f64, z: Option<f64>) -> Point3d {
    let missing = if matches!(source.kind, CrsKind::Compound(_)) { f64::NAN } else { 0.0 };
    Point3d::new(x, y, z.unwrap_or(missing))
}

fn format_point(point: &Point3d, with_height: bool) -> String {
    if with_height {
        format!("{:.6}, {:.6}, {:.3}", point.x, point.y, point.z)
    } else {
        format!("{:.6}, {:.6}", point.x, point.y)
    }
}
