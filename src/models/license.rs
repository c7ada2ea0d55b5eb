//! License models

use serde::{Deserialize, Serialize};

/// Keys of licenses that already waive copyright; repositories carrying one
/// of these are left alone.
pub const PUBLIC_DOMAIN_EQUIVALENT_KEYS: [&str; 4] = ["unlicense", "cc0-1.0", "0bsd", "wtfpl"];

/// Default replacement license key
pub const DEFAULT_LICENSE_KEY: &str = "unlicense";

/// Replacement license body, resolved once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseText {
    pub body: String,
}

impl LicenseText {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}
