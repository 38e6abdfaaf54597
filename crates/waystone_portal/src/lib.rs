//! Named, linkable portals embedded in a voxel world.
//!
//! [`registry::PortalRegistry`] is the session context: it owns every
//! [`portal::Portal`], detects new sites, keeps links symmetric, answers
//! protection queries and resolves teleports.

pub mod config;
pub mod detect;
pub mod error;
pub mod portal;
pub mod registry;
pub mod target;
pub mod teleport;

#[cfg(test)]
pub(crate) mod test_world;

pub use config::PortalConfig;
pub use error::{ErrorClass, PortalError};
pub use portal::{Orientation, Portal, PortalSummary};
pub use registry::PortalRegistry;
pub use target::{FixedPoint, Target};
pub use teleport::TeleportOutcome;
