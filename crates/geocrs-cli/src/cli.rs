use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoCRS - Coordinate reference system registry and transformation engine
#[derive(Parser, Debug)]
#[command(name = "geocrs")]
#[command(about = "CRS lookup, coordinate transformation and control point fitting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Register an extra TOML store, searched after the bundled one
    #[arg(long = "store", global = true, value_name = "ID=PATH")]
    pub stores: Vec<String>,

    /// Do not register the bundled default store
    #[arg(long, global = true)]
    pub no_default_store: bool,

    /// Tie-break rule when stores prefer different datum shifts
    /// (helmert, ntv2, source or target)
    #[arg(long, global = true, value_name = "RULE")]
    pub tie_break: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a CRS identifier and show its normalized form
    Parse(ParseArgs),

    /// Look a CRS up in the registered stores
    Lookup(LookupArgs),

    /// List registered stores
    Stores,

    /// Transform coordinates between two CRSs
    Transform(TransformArgs),

    /// Fit a transform to control point pairs
    Fit(FitArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Identifier, e.g. EPSG:4326 or urn:ogc:def:crs:EPSG::31467
    pub code: String,
}

#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// CRS identifier
    pub code: String,

    /// Only search the store with this id
    #[arg(long = "in-store", value_name = "ID")]
    pub in_store: Option<String>,

    /// Report lat/lon and northing/easting CRSs with x/y axis order
    #[arg(long)]
    pub force_xy: bool,
}

#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Source CRS
    #[arg(long)]
    pub from: String,

    /// Target CRS
    #[arg(long)]
    pub to: String,

    /// List the steps of the resolved chain
    #[arg(long)]
    pub explain: bool,

    /// Read and write coordinates as x/y (lon/lat) whatever the CRS axis order
    #[arg(long)]
    pub force_xy: bool,

    /// Coordinates as x,y or x,y,z in the source CRS's axis order and units
    #[arg(required = true, allow_hyphen_values = true)]
    pub points: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct FitArgs {
    /// Transform kind (helmert, affine or polynomial)
    #[arg(long, default_value = "affine")]
    pub kind: String,

    /// Polynomial order (1 to 4)
    #[arg(long, default_value_t = 1)]
    pub order: u8,

    /// File with one `source_x source_y target_x target_y` pair per line
    #[arg(long, value_name = "FILE")]
    pub pairs: PathBuf,

    /// Further source coordinates (x,y) to map through the fit
    #[arg(long = "apply", value_name = "X,Y", allow_hyphen_values = true)]
    pub apply: Vec<String>,
}
