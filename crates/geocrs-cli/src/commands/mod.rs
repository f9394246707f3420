//! Command implementations

mod config;
mod fit;
mod lookup;
mod parse;
mod stores;
mod transform;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let result = match &cli.command {
        Commands::Parse(args) => parse::execute(args, &output),
        Commands::Lookup(args) => lookup::execute(&cli, args, &output),
        Commands::Stores => stores::execute(&cli, &output),
        Commands::Transform(args) => transform::execute(&cli, args, &output),
        Commands::Fit(args) => fit::execute(args, &output),
        Commands::Config => config::execute(&cli, &output),
    };

    if let Err(e) = &result {
        output.error(format!("{:#}", e));
    }
    result
}

/// Parse `x,y` or `x,y,z`
pub(crate) fn parse_coordinate(text: &str) -> Result<(f64, f64, Option<f64>)> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid coordinate '{}': {}", text, e))?;
    match values.as_slice() {
        [x, y] => Ok((*x, *y, None)),
        [x, y, z] => Ok((*x, *y, Some(*z))),
        _ => anyhow::bail!("Invalid coordinate '{}': expected x,y or x,y,z", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("9.5, 47.25").unwrap(), (9.5, 47.25, None));
        assert_eq!(parse_coordinate("1,2,3").unwrap(), (1.0, 2.0, Some(3.0)));
        assert_eq!(parse_coordinate("-77.0,38.5").unwrap(), (-77.0, 38.5, None));
        assert!(parse_coordinate("1").is_err());
        assert!(parse_coordinate("a,b").is_err());
        assert!(parse_coordinate("1,2,3,4").is_err());
    }
}
