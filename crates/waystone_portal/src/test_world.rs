use std::cell::Cell;

use glam::{IVec3, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use waystone_shared::block::BlockId;
use waystone_shared::coords::{Location, RealmId};
use waystone_shared::world::{Effect, Traveler, VoxelWorld};

use crate::portal::Orientation;

pub const OVERWORLD: RealmId = RealmId(0);
pub const UNDERDEEP: RealmId = RealmId(1);

/// Sparse world: explicit blocks over a flat ground filled with `ground_block` up to `ground_y`.
pub struct TestWorld {
    pub blocks: FxHashMap<(RealmId, IVec3), BlockId>,
    pub ground_y: i32,
    pub ground_block: BlockId,
    pub surface_queries: Cell<u32>,
    pub effects: Vec<Effect>,
    realms: Vec<String>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            blocks: FxHashMap::default(),
            ground_y: 0,
            ground_block: BlockId::RUBBLESTONE,
            surface_queries: Cell::new(0),
            effects: Vec::new(),
            realms: vec!["overworld".to_string(), "underdeep".to_string()],
        }
    }

    pub fn set(&mut self, realm: RealmId, pos: IVec3, block: BlockId) {
        self.blocks.insert((realm, pos), block);
    }

    /// Builds an obsidian frame around a `width` x `height` interior whose
    /// bottom-left interior voxel is `origin`. The bottom interior row is
    /// build markers, the rest air. Returns the interior voxels.
    pub fn build_frame(
        &mut self,
        realm: RealmId,
        origin: IVec3,
        orientation: Orientation,
        width: i32,
        height: i32,
    ) -> FxHashSet<IVec3> {
        let axis = orientation.axis();
        let mut interior = FxHashSet::default();
        for row in -1..=height {
            for col in -1..=width {
                let pos = origin + axis * col + IVec3::Y * row;
                let edge = row == -1 || row == height || col == -1 || col == width;
                let block = if edge {
                    BlockId::OBSIDIAN
                } else if row == 0 {
                    BlockId::WAYSTONE_MARKER
                } else {
                    BlockId::AIR
                };
                self.set(realm, pos, block);
                if !edge {
                    interior.insert(pos);
                }
            }
        }
        interior
    }
}

impl VoxelWorld for TestWorld {
    fn block_at(&self, realm: RealmId, pos: IVec3) -> BlockId {
        if let Some(block) = self.blocks.get(&(realm, pos)) {
            return *block;
        }
        if pos.y <= self.ground_y {
            self.ground_block
        } else {
            BlockId::AIR
        }
    }

    fn set_blocks(&mut self, realm: RealmId, positions: &[IVec3], block: BlockId) {
        for pos in positions {
            self.set(realm, *pos, block);
        }
    }

    fn surface_height(&self, realm: RealmId, x: i32, z: i32) -> i32 {
        self.surface_queries.set(self.surface_queries.get() + 1);
        self.blocks
            .iter()
            .filter(|((r, pos), block)| {
                *r == realm && pos.x == x && pos.z == z && **block != BlockId::AIR
            })
            .map(|((_, pos), _)| pos.y)
            .fold(self.ground_y, i32::max)
    }

    fn realm_id(&self, name: &str) -> Option<RealmId> {
        self.realms
            .iter()
            .position(|realm| realm == name)
            .map(|index| RealmId(index as u16))
    }

    fn realm_name(&self, realm: RealmId) -> Option<String> {
        self.realms.get(usize::from(realm.0)).cloned()
    }

    fn play_effect(&mut self, _at: Location, effect: Effect) {
        self.effects.push(effect);
    }
}

pub struct TestTraveler {
    pub location: Location,
    pub velocity: Vec3,
    pub messages: Vec<String>,
    pub teleports: u32,
}

impl TestTraveler {
    pub fn at(location: Location) -> Self {
        Self {
            location,
            velocity: Vec3::ZERO,
            messages: Vec::new(),
            teleports: 0,
        }
    }
}

impl Traveler for TestTraveler {
    fn location(&self) -> Location {
        self.location
    }

    fn teleport_to(&mut self, destination: Location) {
        self.location = destination;
        self.teleports += 1;
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn send_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
