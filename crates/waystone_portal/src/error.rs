use std::io;

use glam::IVec3;
use thiserror::Error;

/// How an error should be treated by whoever receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Reported verbatim to the requester; nothing changed.
    User,
    /// Aborts a load; the process keeps running.
    Configuration,
    /// Stored data is unusable at the point of use.
    DataCorruption,
    /// Disk I/O failed; in-memory state was still mutated.
    Persistence,
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Portal '{0}' does not exist.")]
    UnknownPortal(String),

    #[error("A portal named '{0}' already exists.")]
    DuplicateName(String),

    #[error("'{0}' is not a valid portal name (no spaces or ':', and 'random' is reserved).")]
    InvalidName(String),

    #[error("Could not detect a suitable portal site within {radius} blocks.")]
    NoBuildSite { radius: i32 },

    #[error("That site is already part of portal '{0}'.")]
    SiteClaimed(String),

    #[error("Can't link '{from}' and '{to}': portals can't link between different worlds.")]
    CrossRealm { from: String, to: String },

    #[error("Portal '{0}' can't be linked to itself.")]
    SelfLink(String),

    #[error("There's no free space around portal '{name}' (anchor {anchor}).")]
    NoFreeSpace { name: String, anchor: IVec3 },

    #[error("Portal '{portal}' is not in a known world ('{realm}').")]
    UnknownRealm { portal: String, realm: String },

    #[error("Portal '{portal}' links to '{target}', but that doesn't exist!")]
    DanglingLink { portal: String, target: String },

    #[error("Could not rebuild portal '{0}' from its saved anchor.")]
    SiteLost(String),

    #[error("Portals '{portal}' and '{other}' claim the same blocks.")]
    OverlappingSites { portal: String, other: String },

    #[error("Portal '{portal}' has an unreadable target '{target}'.")]
    BadTarget { portal: String, target: String },

    #[error("Portal file is unreadable: {0}")]
    CorruptFile(io::Error),

    #[error("Malformed fixed point '{0}'.")]
    MalformedPoint(String),

    #[error("Could not save portal configuration: {0}")]
    Persistence(#[from] io::Error),
}

impl PortalError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownPortal(_)
            | Self::DuplicateName(_)
            | Self::InvalidName(_)
            | Self::NoBuildSite { .. }
            | Self::SiteClaimed(_)
            | Self::CrossRealm { .. }
            | Self::SelfLink(_)
            | Self::NoFreeSpace { .. } => ErrorClass::User,
            Self::UnknownRealm { .. }
            | Self::DanglingLink { .. }
            | Self::SiteLost(_)
            | Self::OverlappingSites { .. }
            | Self::BadTarget { .. }
            | Self::CorruptFile(_) => ErrorClass::Configuration,
            Self::MalformedPoint(_) => ErrorClass::DataCorruption,
            Self::Persistence(_) => ErrorClass::Persistence,
        }
    }

    /// Sorts a store read failure into unreadable content versus plain I/O.
    pub(crate) fn from_load(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::InvalidData {
            Self::CorruptFile(err)
        } else {
            Self::Persistence(err)
        }
    }
}
