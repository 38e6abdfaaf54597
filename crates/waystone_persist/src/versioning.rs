use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::info;

use crate::record::{PortalFile, PortalRecord};

pub const CURRENT_PORTAL_FORMAT_VERSION: u32 = 1;

/// Files written before the version field existed: the world name, a float
/// location vector and the older flag names.
#[derive(Deserialize)]
struct PortalFileV0 {
    #[serde(default)]
    portals: BTreeMap<String, PortalRecordV0>,
}

#[derive(Deserialize)]
struct PortalRecordV0 {
    world: String,
    location: LegacyVector,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    is_east_west: bool,
    #[serde(default)]
    flipped: bool,
}

#[derive(Deserialize)]
struct LegacyVector {
    x: f64,
    y: f64,
    z: f64,
}

/// Parses a portal file of any known format version into the current layout.
pub fn decode_portal_file(contents: &str) -> Result<PortalFile, String> {
    let table: toml::Table =
        toml::from_str(contents).map_err(|err| format!("failed to parse portal file: {err}"))?;
    let version = match table.get("format_version") {
        None => 0,
        Some(toml::Value::Integer(value)) => u32::try_from(*value)
            .map_err(|_| format!("invalid portal format version {value}"))?,
        Some(other) => {
            return Err(format!(
                "portal format version must be an integer, found {}",
                other.type_str()
            ))
        }
    };
    migrate_portal_table(version, table)
}

pub fn encode_portal_file(file: &PortalFile) -> Result<String, String> {
    toml::to_string_pretty(file).map_err(|err| format!("failed to encode portal file: {err}"))
}

fn migrate_portal_table(mut version: u32, mut table: toml::Table) -> Result<PortalFile, String> {
    if version > CURRENT_PORTAL_FORMAT_VERSION {
        return Err(format!(
            "unsupported portal format version {version}; current version is {CURRENT_PORTAL_FORMAT_VERSION}"
        ));
    }

    while version < CURRENT_PORTAL_FORMAT_VERSION {
        let next_version = version + 1;
        info!("Migrating portal file format v{version} -> v{next_version}");
        table = migrate_one_version(version, table)?;
        version = next_version;
    }

    toml::Value::Table(table)
        .try_into::<PortalFile>()
        .map_err(|err| format!("failed to decode portal file v{version}: {err}"))
}

fn migrate_one_version(version: u32, table: toml::Table) -> Result<toml::Table, String> {
    match version {
        0 => migrate_portals_v0_to_v1(table),
        other => Err(format!(
            "missing migration path for portal format v{other} -> v{}",
            other + 1
        )),
    }
}

fn migrate_portals_v0_to_v1(table: toml::Table) -> Result<toml::Table, String> {
    let v0: PortalFileV0 = toml::Value::Table(table)
        .try_into()
        .map_err(|err| format!("failed to decode portal file v0: {err}"))?;

    let portals = v0
        .portals
        .into_iter()
        .map(|(name, legacy)| {
            let record = PortalRecord {
                realm: legacy.world,
                anchor: [
                    legacy.location.x.floor() as i32,
                    legacy.location.y.floor() as i32,
                    legacy.location.z.floor() as i32,
                ],
                target: legacy.target,
                east_west: legacy.is_east_west,
                mirrored: legacy.flipped,
            };
            (name, record)
        })
        .collect();

    let v1 = PortalFile {
        format_version: 1,
        portals,
    };
    match toml::Value::try_from(v1) {
        Ok(toml::Value::Table(table)) => Ok(table),
        Ok(other) => Err(format!(
            "migrated portal file encoded as {} instead of a table",
            other.type_str()
        )),
        Err(err) => Err(format!("failed to encode migrated v1 portal file: {err}")),
    }
}
