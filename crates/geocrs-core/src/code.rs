//! CRS code parsing and normalization
//!
//! Heterogeneous textual identifiers (`EPSG:4326`, OGC URNs, OGC HTTP URIs,
//! literal tokens such as `CRS:84`) are normalized into a
//! `(codespace, version, code)` triple. Parsing never fails: anything that does
//! not match a structured form becomes an opaque code that echoes the input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

const URN_OGC: &str = "URN:OGC:DEF:CRS:";
const URN_X_OGC: &str = "URN:X-OGC:DEF:CRS:";
const GML_SRS: &str = "/GML/SRS/";
const DEF_CRS: &str = "/DEF/CRS/";

/// Tokens that are identifiers in their own right and must round-trip verbatim.
const LITERAL_TOKENS: &[&str] = &["CRS:84", "CRS:83", "CRS:27", "CRS84", "WGS84(DD)"];

/// A parsed CRS identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsCode {
    codespace: String,
    version: String,
    code: String,
    original: String,
}

impl CrsCode {
    /// Create a structured code from its parts, e.g. `CrsCode::new("4326", "epsg")`
    pub fn new(code: impl Into<String>, codespace: impl Into<String>) -> Self {
        Self::with_version(code, codespace, "")
    }

    /// Create a structured code with an explicit version
    pub fn with_version(
        code: impl Into<String>,
        codespace: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let code = code.into();
        let codespace = codespace.into().to_lowercase();
        let version = version.into();
        let original = canonical(&codespace, &version, &code);
        Self { codespace, version, code, original }
    }

    /// Parse any accepted textual form. Total: unparseable input degrades to
    /// an opaque code with empty codespace and version.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let mut code = parse_structured(trimmed).unwrap_or_else(|| Self::opaque(trimmed));
        code.original = input.to_string();
        code
    }

    fn opaque(input: &str) -> Self {
        Self {
            codespace: String::new(),
            version: String::new(),
            code: input.to_string(),
            original: input.to_string(),
        }
    }

    fn structured(original: &str, codespace: &str, version: &str, code: &str) -> Option<Self> {
        if codespace.is_empty() || code.is_empty() {
            return None;
        }
        // `urn:ogc:def:crs:CRS::84` and friends name a literal token
        if codespace.eq_ignore_ascii_case("crs") {
            let token = format!("CRS:{}", code.to_uppercase());
            if LITERAL_TOKENS.contains(&token.as_str()) {
                return Some(Self {
                    codespace: String::new(),
                    version: String::new(),
                    code: token,
                    original: original.to_string(),
                });
            }
        }
        Some(Self {
            codespace: codespace.to_lowercase(),
            version: version.to_string(),
            code: code.to_string(),
            original: original.to_string(),
        })
    }

    pub fn codespace(&self) -> &str {
        &self.codespace
    }

    pub fn code_version(&self) -> &str {
        &self.version
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// The string this code was parsed from, verbatim
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Opaque codes carry no codespace; they only match by their original text.
    pub fn is_opaque(&self) -> bool {
        self.codespace.is_empty()
    }

    /// Loose comparison used by store lookups: codespace and code are compared
    /// case-insensitively and the version only matters when both sides have one.
    pub fn equals_code(&self, other: &CrsCode) -> bool {
        if self.is_opaque() || other.is_opaque() {
            return self.code.eq_ignore_ascii_case(&other.code);
        }
        let versions_match = self.version.is_empty()
            || other.version.is_empty()
            || self.version.eq_ignore_ascii_case(&other.version);
        self.codespace == other.codespace
            && self.code.eq_ignore_ascii_case(&other.code)
            && versions_match
    }

    /// Key used for hashed lookups; ignores the version
    pub fn lookup_key(&self) -> String {
        if self.is_opaque() {
            self.code.to_lowercase()
        } else {
            format!("{}:{}", self.codespace, self.code.to_lowercase())
        }
    }
}

impl PartialEq for CrsCode {
    fn eq(&self, other: &Self) -> bool {
        self.codespace == other.codespace && self.version == other.version && self.code == other.code
    }
}

impl Eq for CrsCode {}

impl Hash for CrsCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.codespace.hash(state);
        self.version.hash(state);
        self.code.hash(state);
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            // Echo the input unless it was a structured spelling of a literal token
            if self.code == self.original.trim() {
                f.write_str(&self.original)
            } else {
                f.write_str(&self.code)
            }
        } else {
            f.write_str(&canonical(&self.codespace, &self.version, &self.code))
        }
    }
}

impl From<&str> for CrsCode {
    fn from(value: &str) -> Self {
        CrsCode::parse(value)
    }
}

fn canonical(codespace: &str, version: &str, code: &str) -> String {
    if codespace.is_empty() {
        code.to_string()
    } else if version.is_empty() {
        format!("{}:{}", codespace, code)
    } else {
        format!("{}:{}:{}", codespace, version, code)
    }
}

fn parse_structured(input: &str) -> Option<CrsCode> {
    if input.is_empty() {
        return None;
    }
    let upper = input.to_uppercase();
    if LITERAL_TOKENS.contains(&upper.as_str()) {
        return None;
    }

    if upper.starts_with(URN_OGC) || upper.starts_with(URN_X_OGC) {
        return parse_urn(input);
    }
    if upper.starts_with("HTTP://") || upper.starts_with("HTTPS://") {
        if let Some(pos) = upper.find(GML_SRS) {
            return parse_gml_srs(input, pos + GML_SRS.len());
        }
        if let Some(pos) = upper.find(DEF_CRS) {
            return parse_def_crs(input, pos + DEF_CRS.len());
        }
        return None;
    }

    let parts: Vec<&str> = input.split(':').collect();
    match parts.as_slice() {
        [codespace, code] => CrsCode::structured(input, codespace, "", code),
        [codespace, version, code] => CrsCode::structured(input, codespace, version, code),
        _ => None,
    }
}

/// `URN:OGC:DEF:CRS:EPSG::4326`, `URN:X-OGC:DEF:CRS:EPSG:6.11:4326`,
/// and the version-less `URN:OGC:DEF:CRS:EPSG:4326`
fn parse_urn(input: &str) -> Option<CrsCode> {
    let parts: Vec<&str> = input.split(':').collect();
    match parts.len() {
        6 => CrsCode::structured(input, parts[4], "", parts[5]),
        7 => CrsCode::structured(input, parts[4], parts[5], parts[6]),
        _ => None,
    }
}

/// `http://www.opengis.net/gml/srs/epsg.xml#4326`
fn parse_gml_srs(input: &str, start: usize) -> Option<CrsCode> {
    let rest = input.get(start..)?;
    let (authority, code) = rest.split_once('#')?;
    let authority = authority
        .strip_suffix(".xml")
        .or_else(|| authority.strip_suffix(".XML"))
        .unwrap_or(authority);
    if authority.contains('/') {
        return None;
    }
    CrsCode::structured(input, authority, "", code)
}

/// `http://www.opengis.net/def/crs/EPSG/0/4326`
fn parse_def_crs(input: &str, start: usize) -> Option<CrsCode> {
    let rest = input.get(start..)?.trim_end_matches('/');
    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [authority, version, code] => CrsCode::structured(input, authority, version, code),
        [authority, code] => CrsCode::structured(input, authority, "", code),
        _ => None,
    }
}
