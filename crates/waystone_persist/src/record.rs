use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::versioning::CURRENT_PORTAL_FORMAT_VERSION;

/// One persisted portal. `target` holds the textual target form
/// (`portal:<name>`, `random`, `point:<x>,<y>,<z>:<pitch>:<yaw>`), absent when unlinked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalRecord {
    pub realm: String,
    pub anchor: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub east_west: bool,
    #[serde(default)]
    pub mirrored: bool,
}

/// Whole-registry snapshot; written in full on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalFile {
    pub format_version: u32,
    #[serde(default)]
    pub portals: BTreeMap<String, PortalRecord>,
}

impl Default for PortalFile {
    fn default() -> Self {
        Self {
            format_version: CURRENT_PORTAL_FORMAT_VERSION,
            portals: BTreeMap::new(),
        }
    }
}

impl PortalFile {
    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }
}
