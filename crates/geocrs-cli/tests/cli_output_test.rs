//! Integration tests for the geocrs binary
//!
//! These tests run the built binary and check its JSON output.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

fn geocrs_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("geocrs");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(geocrs_bin())
        .args(args)
        .env_remove("GEOCRS_CHAIN_CACHE_CAPACITY")
        .env_remove("GEOCRS_DATUM_SHIFT_TIE_BREAK")
        .env_remove("GEOCRS_PARALLEL_THRESHOLD")
        .env_remove("GEOCRS_LOAD_DEFAULT_STORE")
        .output()
        .expect("Failed to execute command")
}

fn json_data(output: &Output) -> serde_json::Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

const SITE_STORE: &str = r#"
[[datum]]
id = "site-a"
ellipsoid = "GRS80"

[[crs]]
codes = ["SITE:A"]
name = "Site A"
type = "geographic"
datum = "site-a"
"#;

#[test]
fn test_parse_reports_components() {
    let data = json_data(&run(&["parse", "urn:ogc:def:crs:EPSG::31467", "--json"]));
    assert_eq!(data["canonical"], "epsg:31467");
    assert_eq!(data["codespace"], "epsg");
    assert_eq!(data["code"], "31467");
    assert_eq!(data["opaque"], false);
}

#[test]
fn test_lookup_bundled_crs() {
    let data = json_data(&run(&["lookup", "EPSG:31467", "--json"]));
    assert_eq!(data["name"], "DHDN / 3-degree Gauss-Kruger zone 3");
    assert_eq!(data["crs_type"], "projected");
    assert_eq!(data["store"], "default");
    assert_eq!(data["projection"], "Transverse Mercator");
    assert_eq!(data["has_height"], false);
}

#[test]
fn test_lookup_unknown_code_fails() {
    let output = run(&["lookup", "EPSG:999999", "--json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let error_line = stderr.lines().skip_while(|l| !l.starts_with('{')).collect::<Vec<_>>().join("\n");
    let parsed: serde_json::Value = serde_json::from_str(&error_line).expect("Error should be valid JSON");
    assert_eq!(parsed["status"], "error");
}

#[test]
fn test_transform_to_utm() {
    let data = json_data(&run(&["transform", "--from", "EPSG:4326", "--to", "EPSG:32632", "--explain", "--json", "9,0"]));
    let point = &data["points"][0];
    assert!((point["x"].as_f64().unwrap() - 500000.0).abs() < 1e-3);
    assert!(point["y"].as_f64().unwrap().abs() < 1e-3);
    assert!(!data["steps"].as_array().unwrap().is_empty());
}

const HEIGHT_STORE: &str = r#"
[[datum]]
id = "site-a"
ellipsoid = "GRS80"

[[crs]]
codes = ["SITE:A"]
name = "Site A"
type = "geographic"
datum = "site-a"
axis_order = "north_east"

[[crs]]
codes = ["SITE:H"]
name = "Site A with height"
type = "compound"
underlying = "SITE:A"
default_height = 250.0

[[crs]]
codes = ["SITE:G"]
name = "Site A geocentric"
type = "geocentric"
datum = "site-a"
"#;

#[test]
fn test_compound_source_uses_default_height() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(HEIGHT_STORE.as_bytes()).unwrap();
    let store = format!("site={}", file.path().display());

    let args = ["transform", "--no-default-store", "--store", &store, "--from", "SITE:H", "--to", "SITE:G", "--json"];
    let data = json_data(&run(&[&args[..], &["0,0"]].concat()));
    assert!((data["points"][0]["x"].as_f64().unwrap() - 6_378_387.0).abs() < 1e-6);

    let data = json_data(&run(&[&args[..], &["0,0,10"]].concat()));
    assert!((data["points"][0]["x"].as_f64().unwrap() - 6_378_147.0).abs() < 1e-6);
}

#[test]
fn test_force_xy_lookup_and_transform() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(HEIGHT_STORE.as_bytes()).unwrap();
    let store = format!("site={}", file.path().display());

    let data = json_data(&run(&["lookup", "SITE:A", "--no-default-store", "--store", &store, "--json"]));
    assert_eq!(data["axis_order"], "north_east");
    let data = json_data(&run(&["lookup", "SITE:A", "--force-xy", "--no-default-store", "--store", &store, "--json"]));
    assert_eq!(data["axis_order"], "east_north");

    // lon 90, lat 0 lies on the geocentric y axis
    let base = ["transform", "--no-default-store", "--store", &store, "--from", "SITE:A", "--to", "SITE:G", "--json"];
    let data = json_data(&run(&[&base[..], &["--force-xy", "90,0"]].concat()));
    assert!((data["points"][0]["y"].as_f64().unwrap() - 6_378_137.0).abs() < 1e-6);
    let data = json_data(&run(&[&base[..], &["0,90"]].concat()));
    assert!((data["points"][0]["y"].as_f64().unwrap() - 6_378_137.0).abs() < 1e-6);
}

#[test]
fn test_extra_store_without_default() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SITE_STORE.as_bytes()).unwrap();
    let store = format!("site={}", file.path().display());

    let data = json_data(&run(&["stores", "--no-default-store", "--store", &store, "--json"]));
    let stores = data["stores"].as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["id"], "site");
    assert_eq!(stores[0]["crs_count"], 1);

    let data = json_data(&run(&["lookup", "site:a", "--no-default-store", "--store", &store, "--json"]));
    assert_eq!(data["store"], "site");

    let output = run(&["lookup", "EPSG:4326", "--no-default-store", "--store", &store, "--json"]);
    assert!(!output.status.success());
}

#[test]
fn test_fit_affine_from_pairs() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# source_x source_y target_x target_y").unwrap();
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (5.0, 3.0)] {
        writeln!(file, "{} {} {} {}", x, y, 100.0 + 2.0 * x, 50.0 + 3.0 * y).unwrap();
    }
    let pairs = file.path().to_str().unwrap().to_string();

    let data = json_data(&run(&["fit", "--kind", "affine", "--pairs", &pairs, "--apply", "1,1", "--json"]));
    assert_eq!(data["points"], 5);
    assert!(data["rmse"].as_f64().unwrap() < 1e-6);
    let applied = &data["applied"][0];
    assert!((applied[0].as_f64().unwrap() - 102.0).abs() < 1e-6);
    assert!((applied[1].as_f64().unwrap() - 53.0).abs() < 1e-6);
}

#[test]
fn test_fit_with_too_few_points_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0 0 1 1").unwrap();
    writeln!(file, "1 0 2 1").unwrap();
    let pairs = file.path().to_str().unwrap().to_string();

    let output = run(&["fit", "--kind", "affine", "--pairs", &pairs]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least 3 control points"));
}

#[test]
fn test_config_reports_sources() {
    let data = json_data(&run(&["config", "--tie-break", "target", "--json"]));
    let entries = data["entries"].as_array().unwrap();
    let tie_break = entries.iter().find(|e| e["key"] == "datum_shift_tie_break").unwrap();
    assert_eq!(tie_break["value"], "Target");
    assert_eq!(tie_break["source"], "Cli");
    let capacity = entries.iter().find(|e| e["key"] == "chain_cache_capacity").unwrap();
    assert_eq!(capacity["source"], "Default");
}
