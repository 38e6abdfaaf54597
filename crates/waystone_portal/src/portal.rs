use std::fmt;
use std::time::Instant;

use glam::IVec3;
use rustc_hash::FxHashSet;
use waystone_shared::block::BlockId;
use waystone_shared::coords::{RealmId, VoxelPos};

use crate::target::Target;

/// Horizontal axis along which a portal surface extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    EastWest,
    NorthSouth,
}

impl Orientation {
    pub fn from_east_west(east_west: bool) -> Self {
        if east_west {
            Self::EastWest
        } else {
            Self::NorthSouth
        }
    }

    pub fn is_east_west(self) -> bool {
        self == Self::EastWest
    }

    /// Unit step along the surface.
    pub fn axis(self) -> IVec3 {
        match self {
            Self::EastWest => IVec3::X,
            Self::NorthSouth => IVec3::Z,
        }
    }

    /// Unit step through the surface.
    pub fn normal(self) -> IVec3 {
        match self {
            Self::EastWest => IVec3::Z,
            Self::NorthSouth => IVec3::X,
        }
    }

    pub fn surface_block(self) -> BlockId {
        match self {
            Self::EastWest => BlockId::PORTAL_SURFACE_EW,
            Self::NorthSouth => BlockId::PORTAL_SURFACE_NS,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EastWest => f.write_str("east-west"),
            Self::NorthSouth => f.write_str("north-south"),
        }
    }
}

/// One physical portal. Only the registry mutates portals, which keeps
/// linked pairs symmetric.
#[derive(Debug, Clone)]
pub struct Portal {
    pub(crate) name: String,
    pub(crate) realm: RealmId,
    pub(crate) realm_name: String,
    pub(crate) anchor: IVec3,
    pub(crate) orientation: Orientation,
    pub(crate) mirrored: bool,
    pub(crate) target: Target,
    pub(crate) surface: FxHashSet<IVec3>,
    /// Distance from the anchor to the farthest surface voxel.
    pub(crate) reach: f32,
    pub(crate) cooldown_until: Instant,
}

impl Portal {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn realm(&self) -> RealmId {
        self.realm
    }

    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    pub fn anchor(&self) -> IVec3 {
        self.anchor
    }

    pub fn anchor_pos(&self) -> VoxelPos {
        VoxelPos::new(self.realm, self.anchor)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn surface(&self) -> &FxHashSet<IVec3> {
        &self.surface
    }

    pub fn reach(&self) -> f32 {
        self.reach
    }

    pub fn contains(&self, pos: VoxelPos) -> bool {
        pos.realm == self.realm && self.surface.contains(&pos.pos)
    }

    pub fn cooldown_until(&self) -> Instant {
        self.cooldown_until
    }

    pub fn is_cooling_down(&self, now: Instant) -> bool {
        now < self.cooldown_until
    }

    pub fn summary(&self) -> PortalSummary {
        PortalSummary {
            name: self.name.clone(),
            target: self.target.clone(),
        }
    }

    /// Surface voxels in a stable order (bottom row first), for bulk writes.
    pub(crate) fn surface_sorted(&self) -> Vec<IVec3> {
        let mut voxels: Vec<IVec3> = self.surface.iter().copied().collect();
        voxels.sort_by_key(|pos| (pos.y, pos.z, pos.x));
        voxels
    }
}

pub(crate) fn surface_reach(anchor: IVec3, surface: &FxHashSet<IVec3>) -> f32 {
    surface
        .iter()
        .map(|pos| pos.as_vec3().distance(anchor.as_vec3()))
        .fold(0.0, f32::max)
}

/// One line of the portal listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSummary {
    pub name: String,
    pub target: Target,
}

impl fmt::Display for PortalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.target)
    }
}
