use glam::{IVec3, Vec3};

use crate::block::BlockId;
use crate::coords::{Location, RealmId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    PortalOpened,
    PortalClosed,
    Teleported,
}

/// Voxel storage the portal logic reads and writes through.
pub trait VoxelWorld {
    fn block_at(&self, realm: RealmId, pos: IVec3) -> BlockId;

    /// Writes `block` to every position; hosts should make the whole batch
    /// visible at once.
    fn set_blocks(&mut self, realm: RealmId, positions: &[IVec3], block: BlockId);

    /// Y of the highest non-air voxel in the column at `(x, z)`.
    fn surface_height(&self, realm: RealmId, x: i32, z: i32) -> i32;

    fn realm_id(&self, name: &str) -> Option<RealmId>;

    fn realm_name(&self, realm: RealmId) -> Option<String>;

    fn play_effect(&mut self, _at: Location, _effect: Effect) {}
}

/// An entity that can walk through portals.
pub trait Traveler {
    fn location(&self) -> Location;

    fn teleport_to(&mut self, destination: Location);

    fn set_velocity(&mut self, velocity: Vec3);

    fn send_message(&mut self, message: &str);
}
