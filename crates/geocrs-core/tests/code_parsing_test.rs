//! CRS code parsing across the accepted textual forms

use geocrs_core::CrsCode;
use proptest::prelude::*;

#[test]
fn test_literal_tokens_round_trip_verbatim() {
    for token in ["CRS:84", "crs:84", "CRS84", "WGS84(DD)"] {
        let code = CrsCode::parse(token);
        assert!(code.is_opaque(), "{} should be opaque", token);
        assert_eq!(code.to_string(), token);
        assert_eq!(code.codespace(), "");
        assert_eq!(code.code_version(), "");
    }
}

#[test]
fn test_x_ogc_urn_with_version() {
    let code = CrsCode::parse("URN:X-OGC:DEF:CRS:EPSG:6.11:4326");
    assert_eq!(code.code_version(), "6.11");
    assert_eq!(code.codespace(), "epsg");
    assert_eq!(code.code(), "4326");
    assert_eq!(code.to_string(), "epsg:6.11:4326");
}

#[test]
fn test_http_forms_agree() {
    let gml = CrsCode::parse("http://www.opengis.net/gml/srs/epsg.xml#31467");
    let def = CrsCode::parse("http://www.opengis.net/def/crs/EPSG/0/31467");
    let plain = CrsCode::parse("EPSG:31467");
    assert_eq!(gml, plain);
    assert!(def.equals_code(&plain));
    assert_eq!(def.code_version(), "0");
}

#[test]
fn test_ogc_crs84_uri() {
    let code = CrsCode::parse("http://www.opengis.net/def/crs/OGC/1.3/CRS84");
    assert_eq!(code.codespace(), "ogc");
    assert_eq!(code.code_version(), "1.3");
    assert_eq!(code.code(), "CRS84");
}

#[test]
fn test_garbage_is_total() {
    for input in ["", "   ", "4326", "no such thing", "a:b:c:d", "urn:ogc:def:crs:", "https://example.com/"] {
        let code = CrsCode::parse(input);
        assert!(code.is_opaque());
        assert_eq!(code.to_string(), input);
    }
}

#[test]
fn test_crs_urn_reparses_to_same_code() {
    let urn = CrsCode::parse("urn:ogc:def:crs:CRS::84");
    assert_eq!(urn.to_string(), "CRS:84");
    assert_eq!(CrsCode::parse(&urn.to_string()), urn);
    assert_eq!(urn.original(), "urn:ogc:def:crs:CRS::84");
}

fn authority() -> impl Strategy<Value = String> {
    prop_oneof![Just("CRS".to_string()), "[A-Za-z]{1,8}"]
}

fn version() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}"]
}

fn code() -> impl Strategy<Value = String> {
    "[0-9]{1,6}"
}

/// Well-formed identifiers in every structured form
fn well_formed() -> impl Strategy<Value = String> {
    (authority(), version(), code(), 0..4usize).prop_map(|(auth, ver, code, form)| match form {
        0 if ver.is_empty() => format!("{}:{}", auth, code),
        0 => format!("{}:{}:{}", auth, ver, code),
        1 => format!("urn:ogc:def:crs:{}:{}:{}", auth, ver, code),
        2 if ver.is_empty() => format!("http://www.opengis.net/gml/srs/{}.xml#{}", auth.to_lowercase(), code),
        2 => format!("http://www.opengis.net/def/crs/{}/{}/{}", auth, ver, code),
        _ => format!("URN:X-OGC:DEF:CRS:{}:{}:{}", auth.to_uppercase(), ver, code),
    })
}

proptest! {
    #[test]
    fn test_parse_is_idempotent_over_display(input in well_formed()) {
        let parsed = CrsCode::parse(&input);
        let reparsed = CrsCode::parse(&parsed.to_string());
        prop_assert_eq!(&reparsed, &parsed);
        prop_assert_eq!(reparsed.to_string(), parsed.to_string());
    }

    #[test]
    fn test_parse_never_panics(input in "\\PC{0,40}") {
        let code = CrsCode::parse(&input);
        prop_assert_eq!(code.original(), input.as_str());
        if code.is_opaque() && code.code() == input.trim() {
            prop_assert_eq!(code.to_string(), input);
        }
    }

    #[test]
    fn test_codespace_is_lowercase(input in well_formed()) {
        let parsed = CrsCode::parse(&input);
        prop_assert_eq!(parsed.codespace(), parsed.codespace().to_lowercase());
    }
}
