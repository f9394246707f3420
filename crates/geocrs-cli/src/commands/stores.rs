//! Stores command implementation

use crate::cli::Cli;
use crate::config_loader::{build_registry, load_config};
use crate::output::OutputWriter;
use crate::output_types::{StoreInfo, StoresOutput};
use anyhow::Result;
use tabled::Tabled;

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli)?;
    let registry = build_registry(cli, &config)?;

    let stores: Vec<StoreInfo> = registry
        .stores()
        .iter()
        .map(|s| StoreInfo {
            id: s.id().to_string(),
            location: s.location().to_string(),
            crs_count: s.len(),
            transformation_count: s.transformations().len(),
            preferred_strategy: s.preferred_strategy().to_string(),
        })
        .collect();

    if output.is_json() {
        return output.result(StoresOutput { stores });
    }

    output.section("Registered Stores");
    if stores.is_empty() {
        output.info("No stores registered");
        return Ok(());
    }

    #[derive(Tabled)]
    struct StoreRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Location")]
        location: String,
        #[tabled(rename = "CRSs")]
        crs_count: usize,
        #[tabled(rename = "Transformations")]
        transformation_count: usize,
        #[tabled(rename = "Prefers")]
        preferred_strategy: String,
    }

    let rows: Vec<StoreRow> = stores
        .into_iter()
        .map(|s| StoreRow {
            id: s.id,
            location: s.location,
            crs_count: s.crs_count,
            transformation_count: s.transformation_count,
            preferred_strategy: s.preferred_strategy,
        })
        .collect();
    output.table(rows);
    Ok(())
}
