//! Parse command implementation

use crate::cli::ParseArgs;
use crate::output::OutputWriter;
use crate::output_types::ParseOutput;
use anyhow::Result;
use geocrs_core::CrsCode;

pub fn execute(args: &ParseArgs, output: &OutputWriter) -> Result<()> {
    let code = CrsCode::parse(&args.code);
    let parsed = ParseOutput {
        input: code.original().to_string(),
        canonical: code.to_string(),
        codespace: code.codespace().to_string(),
        version: code.code_version().to_string(),
        code: code.code().to_string(),
        opaque: code.is_opaque(),
    };

    if output.is_json() {
        return output.result(parsed);
    }

    output.section("CRS Code");
    output.kv("Input", &parsed.input);
    output.kv("Canonical", &parsed.canonical);
    if parsed.opaque {
        output.info("Not a structured identifier; it only matches codes with the same text");
    } else {
        output.kv("Codespace", &parsed.codespace);
        output.kv("Version", if parsed.version.is_empty() { "-" } else { &parsed.version });
        output.kv("Code", &parsed.code);
    }
    Ok(())
}
