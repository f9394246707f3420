//! Lookup command implementation

use crate::cli::{Cli, LookupArgs};
use crate::config_loader::{build_registry, load_config};
use crate::output::OutputWriter;
use crate::output_types::LookupOutput;
use anyhow::Result;
use geocrs_core::models::{AxisOrder, Crs, CrsKind};

pub fn execute(cli: &Cli, args: &LookupArgs, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let registry = build_registry(cli, &config)?;

    let crs = match &args.in_store {
        Some(store) => registry.lookup_in_with(store, &args.code, args.force_xy)?,
        None => registry.lookup_with(&args.code, args.force_xy)?,
    };
    let info = describe(&crs);

    if output.is_json() {
        return output.result(info);
    }

    output.section(&info.name);
    output.kv("Id", &info.id);
    output.kv("Type", &info.crs_type);
    output.kv("Store", info.store.as_deref().unwrap_or("-"));
    output.kv("Codes", info.codes.join(", "));
    output.kv("Datum", &info.datum);
    output.kv("Ellipsoid", &info.ellipsoid);
    if let Some(projection) = &info.projection {
        output.kv("Projection", projection);
    }
    if let Some(axes) = &info.axis_order {
        output.kv("Axes", axes);
    }
    output.kv("Height", if info.has_height { "yes" } else { "no" });
    Ok(())
}

fn describe(crs: &Crs) -> LookupOutput {
    let datum = crs.datum();
    let projection = match &crs.kind {
        CrsKind::Projected(p) => Some(p.projection().family().to_string()),
        CrsKind::Compound(c) => match &c.underlying.kind {
            CrsKind::Projected(p) => Some(p.projection().family().to_string()),
            _ => None,
        },
        _ => None,
    };
    LookupOutput {
        id: crs.id(),
        name: crs.name().to_string(),
        crs_type: crs.crs_type().to_string(),
        store: crs.store.clone(),
        codes: crs.identifier.codes().iter().map(|c| c.original().to_string()).collect(),
        datum: format!("{} ({})", datum.name, datum.id),
        ellipsoid: datum.ellipsoid.id.clone(),
        projection,
        axis_order: crs.axis_order().map(|order| match order {
            AxisOrder::EastNorth => "east_north".to_string(),
            AxisOrder::NorthEast => "north_east".to_string(),
        }),
        has_height: crs.has_height(),
    }
}
