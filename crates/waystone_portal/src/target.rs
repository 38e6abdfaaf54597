use std::fmt;

use glam::Vec3;
use waystone_shared::coords::{Location, RealmId};

use crate::error::PortalError;

const PORTAL_PREFIX: &str = "portal";
const POINT_PREFIX: &str = "point";
const RANDOM_TARGET: &str = "random";

/// Where a portal sends its travelers.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Unlinked,
    /// The other end of a symmetric pair, by name.
    Linked(String),
    Random,
    FixedPoint(FixedPoint),
}

impl Target {
    /// Parses the persisted form. Fixed points are kept textual and only
    /// validated when used.
    pub fn parse(persisted: Option<&str>) -> Result<Self, String> {
        let Some(raw) = persisted.map(str::trim) else {
            return Ok(Self::Unlinked);
        };
        if raw.is_empty() {
            return Ok(Self::Unlinked);
        }
        if raw == RANDOM_TARGET {
            return Ok(Self::Random);
        }

        match raw.split_once(':') {
            Some((PORTAL_PREFIX, name)) if !name.is_empty() => Ok(Self::Linked(name.to_string())),
            Some((POINT_PREFIX, point)) => Ok(Self::FixedPoint(FixedPoint::from_raw(point))),
            _ => Err(format!("unrecognized portal target '{raw}'")),
        }
    }

    pub fn to_persisted(&self) -> Option<String> {
        match self {
            Self::Unlinked => None,
            Self::Linked(name) => Some(format!("{PORTAL_PREFIX}:{name}")),
            Self::Random => Some(RANDOM_TARGET.to_string()),
            Self::FixedPoint(point) => Some(format!("{POINT_PREFIX}:{}", point.as_str())),
        }
    }

    pub fn linked_name(&self) -> Option<&str> {
        match self {
            Self::Linked(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_unlinked(&self) -> bool {
        matches!(self, Self::Unlinked)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlinked => f.write_str("(unlinked)"),
            Self::Linked(name) => write!(f, "-> {name}"),
            Self::Random => f.write_str("-> (random warp)"),
            Self::FixedPoint(point) => match point.coordinates() {
                Some(coords) => write!(f, "-> (to {coords})"),
                None => f.write_str("[Error] portal target is broken"),
            },
        }
    }
}

/// A fixed destination in its stored form, `<x>,<y>,<z>:<pitch>:<yaw>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPoint(String);

impl FixedPoint {
    pub fn new(position: Vec3, pitch: f32, yaw: f32) -> Self {
        Self(format!(
            "{},{},{}:{}:{}",
            position.x, position.y, position.z, pitch, yaw
        ))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn coordinates(&self) -> Option<&str> {
        self.0.split(':').next().filter(|coords| !coords.is_empty())
    }

    /// Parses the stored point into a location in `realm`.
    pub fn resolve(&self, realm: RealmId) -> Result<Location, PortalError> {
        let malformed = || PortalError::MalformedPoint(self.0.clone());

        let mut parts = self.0.split(':');
        let (Some(coords), Some(pitch), Some(yaw), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let mut axes = coords.split(',');
        let (Some(x), Some(y), Some(z), None) = (axes.next(), axes.next(), axes.next(), axes.next())
        else {
            return Err(malformed());
        };

        let parse = |value: &str| {
            value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|parsed| parsed.is_finite())
                .ok_or_else(malformed)
        };

        let position = Vec3::new(parse(x)?, parse(y)?, parse(z)?);
        Ok(Location::new(realm, position).with_angles(parse(pitch)?, parse(yaw)?))
    }
}
