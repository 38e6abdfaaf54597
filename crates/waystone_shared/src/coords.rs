use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{angles_from_direction, direction_from_angles};

pub const CHUNK_SIZE: usize = 32;
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Host-assigned handle for one world/dimension. Names live with the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RealmId(pub u16);

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realm#{}", self.0)
    }
}

/// A voxel position qualified by its realm.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoxelPos {
    pub realm: RealmId,
    pub pos: IVec3,
}

impl VoxelPos {
    pub fn new(realm: RealmId, pos: IVec3) -> Self {
        Self { realm, pos }
    }

    pub fn offset(self, delta: IVec3) -> Self {
        Self {
            realm: self.realm,
            pos: self.pos + delta,
        }
    }

    /// Straight-line distance, `None` across realms.
    pub fn distance(self, other: VoxelPos) -> Option<f32> {
        (self.realm == other.realm).then(|| self.pos.as_vec3().distance(other.pos.as_vec3()))
    }
}

/// A free position plus facing. Angles are degrees; see [`direction_from_angles`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Location {
    pub realm: RealmId,
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
}

impl Location {
    pub fn new(realm: RealmId, position: Vec3) -> Self {
        Self {
            realm,
            position,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    /// Location standing on the floor center of `pos`.
    pub fn at_voxel(realm: RealmId, pos: IVec3) -> Self {
        Self::new(realm, pos.as_vec3() + Vec3::new(0.5, 0.0, 0.5))
    }

    pub fn with_angles(mut self, pitch: f32, yaw: f32) -> Self {
        self.pitch = pitch;
        self.yaw = yaw;
        self
    }

    pub fn voxel(&self) -> VoxelPos {
        VoxelPos::new(self.realm, self.position.floor().as_ivec3())
    }

    pub fn direction(&self) -> Vec3 {
        direction_from_angles(self.pitch, self.yaw)
    }

    pub fn facing(mut self, direction: Vec3) -> Self {
        let (pitch, yaw) = angles_from_direction(direction);
        self.pitch = pitch;
        self.yaw = yaw;
        self
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

pub fn world_to_chunk(world_pos: IVec3) -> (ChunkPos, LocalPos) {
    let size = CHUNK_SIZE as i32;

    (
        ChunkPos {
            x: world_pos.x.div_euclid(size),
            y: world_pos.y.div_euclid(size),
            z: world_pos.z.div_euclid(size),
        },
        LocalPos {
            x: world_pos.x.rem_euclid(size) as u8,
            y: world_pos.y.rem_euclid(size) as u8,
            z: world_pos.z.rem_euclid(size) as u8,
        },
    )
}

pub fn chunk_to_world(chunk_pos: ChunkPos, local: LocalPos) -> IVec3 {
    let size = CHUNK_SIZE as i32;
    IVec3::new(
        chunk_pos.x * size + i32::from(local.x),
        chunk_pos.y * size + i32::from(local.y),
        chunk_pos.z * size + i32::from(local.z),
    )
}

pub fn local_to_index(local: LocalPos) -> usize {
    usize::from(local.x)
        + usize::from(local.z) * CHUNK_SIZE
        + usize::from(local.y) * CHUNK_SIZE * CHUNK_SIZE
}
