use glam::IVec3;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use waystone_shared::block::{register_default_blocks, BlockId, BlockRegistry};
use waystone_shared::chunk::ChunkData;
use waystone_shared::coords::{chunk_to_world, world_to_chunk, ChunkPos, LocalPos, Location, RealmId, CHUNK_SIZE};
use waystone_shared::world::{Effect, VoxelWorld};

use crate::persistence::{BlockEditFile, BlockEditRecord};

pub const DEFAULT_REALMS: [&str; 2] = ["overworld", "underdeep"];
/// Lowest generated solid layer; everything below is void.
pub const FLOOR_Y: i32 = 0;
/// Top layer of the flat terrain.
pub const SURFACE_Y: i32 = 40;

/// One dimension: generated flat terrain plus edited chunks.
struct Realm {
    name: String,
    chunks: FxHashMap<ChunkPos, ChunkData>,
    edits: FxHashMap<IVec3, BlockId>,
}

impl Realm {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chunks: FxHashMap::default(),
            edits: FxHashMap::default(),
        }
    }
}

pub struct ServerWorld {
    realms: Vec<Realm>,
    registry: BlockRegistry,
}

impl Default for ServerWorld {
    fn default() -> Self {
        Self {
            realms: DEFAULT_REALMS.iter().map(|name| Realm::new(name)).collect(),
            registry: register_default_blocks(),
        }
    }
}

impl ServerWorld {
    /// Resolves a block by registry name or numeric id.
    pub fn resolve_block(&self, name: &str) -> Option<BlockId> {
        if let Some(block) = self.registry.get_by_name(name) {
            return Some(block);
        }
        name.parse::<u16>()
            .ok()
            .map(BlockId)
            .filter(|block| usize::from(block.0) < self.registry.len())
    }

    pub fn realm_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.realms.iter().map(|realm| realm.name.as_str())
    }

    pub fn set_block(&mut self, realm: RealmId, world_pos: IVec3, block: BlockId) -> Option<BlockId> {
        let realm = self.realms.get_mut(usize::from(realm.0))?;
        let (chunk_pos, local_pos) = world_to_chunk(world_pos);
        let chunk = realm
            .chunks
            .entry(chunk_pos)
            .or_insert_with(|| generate_chunk(chunk_pos));
        let previous = chunk.set(local_pos, block);
        if block == generated_block(world_pos.y) {
            realm.edits.remove(&world_pos);
        } else {
            realm.edits.insert(world_pos, block);
        }
        Some(previous)
    }

    /// Every voxel that differs from the generated terrain.
    pub fn edits(&self) -> BlockEditFile {
        let mut edits = Vec::new();
        for realm in &self.realms {
            let mut positions: Vec<(&IVec3, &BlockId)> = realm.edits.iter().collect();
            positions.sort_by_key(|(pos, _)| (pos.y, pos.z, pos.x));
            for (pos, block) in positions {
                let name = self
                    .registry
                    .name_of(*block)
                    .map(str::to_string)
                    .unwrap_or_else(|| block.0.to_string());
                edits.push(BlockEditRecord {
                    realm: realm.name.clone(),
                    pos: pos.to_array(),
                    block: name,
                });
            }
        }
        BlockEditFile { edits }
    }

    /// Replays saved edits; entries naming unknown realms or blocks are skipped.
    pub fn apply_edits(&mut self, file: &BlockEditFile) -> usize {
        let mut applied = 0;
        for edit in &file.edits {
            let Some(realm) = self.realm_id(&edit.realm) else {
                warn!("Skipping block edit in unknown realm '{}'", edit.realm);
                continue;
            };
            let Some(block) = self.resolve_block(&edit.block) else {
                warn!("Skipping unknown block '{}' at {:?}", edit.block, edit.pos);
                continue;
            };
            self.set_block(realm, IVec3::from_array(edit.pos), block);
            applied += 1;
        }
        applied
    }

    fn realm(&self, realm: RealmId) -> Option<&Realm> {
        self.realms.get(usize::from(realm.0))
    }
}

impl VoxelWorld for ServerWorld {
    fn block_at(&self, realm: RealmId, pos: IVec3) -> BlockId {
        let Some(realm) = self.realm(realm) else {
            return BlockId::VOID;
        };
        let (chunk_pos, local_pos) = world_to_chunk(pos);
        match realm.chunks.get(&chunk_pos) {
            Some(chunk) => chunk.get(local_pos),
            None => generated_block(pos.y),
        }
    }

    fn set_blocks(&mut self, realm: RealmId, positions: &[IVec3], block: BlockId) {
        for pos in positions {
            if self.set_block(realm, *pos, block).is_none() {
                warn!("Dropped block write to unknown {realm}");
                return;
            }
        }
    }

    fn surface_height(&self, realm: RealmId, x: i32, z: i32) -> i32 {
        let Some(state) = self.realm(realm) else {
            return FLOOR_Y - 1;
        };

        let size = CHUNK_SIZE as i32;
        let column = world_to_chunk(IVec3::new(x, 0, z)).0;
        let top = state
            .chunks
            .keys()
            .filter(|pos| pos.x == column.x && pos.z == column.z)
            .map(|pos| pos.y * size + size - 1)
            .max()
            .unwrap_or(SURFACE_Y)
            .max(SURFACE_Y);

        (FLOOR_Y..=top)
            .rev()
            .find(|y| self.block_at(realm, IVec3::new(x, *y, z)) != BlockId::AIR)
            .unwrap_or(FLOOR_Y - 1)
    }

    fn realm_id(&self, name: &str) -> Option<RealmId> {
        self.realms
            .iter()
            .position(|realm| realm.name == name)
            .and_then(|index| u16::try_from(index).ok())
            .map(RealmId)
    }

    fn realm_name(&self, realm: RealmId) -> Option<String> {
        self.realm(realm).map(|realm| realm.name.clone())
    }

    fn play_effect(&mut self, at: Location, effect: Effect) {
        debug!("{effect:?} at {} in {}", at.position, at.realm);
    }
}

pub fn generated_block(y: i32) -> BlockId {
    if y < FLOOR_Y {
        BlockId::VOID
    } else if y < SURFACE_Y {
        BlockId::RUBBLESTONE
    } else if y == SURFACE_Y {
        BlockId::VERDANT_TURF
    } else {
        BlockId::AIR
    }
}

fn generate_chunk(pos: ChunkPos) -> ChunkData {
    let size = CHUNK_SIZE as u8;
    let base = chunk_to_world(pos, LocalPos { x: 0, y: 0, z: 0 });
    if base.y > SURFACE_Y {
        return ChunkData::new_empty();
    }
    if base.y + i32::from(size) <= FLOOR_Y {
        return ChunkData::new_filled(BlockId::VOID);
    }

    let mut chunk = ChunkData::new_empty();
    for y in 0..size {
        let block = generated_block(base.y + i32::from(y));
        if block == BlockId::AIR {
            continue;
        }
        for z in 0..size {
            for x in 0..size {
                chunk.set(LocalPos { x, y, z }, block);
            }
        }
    }
    chunk
}

#[cfg(test)]
mod tests {
    use glam::IVec3;
    use waystone_shared::block::BlockId;
    use waystone_shared::coords::RealmId;
    use waystone_shared::world::VoxelWorld;

    use super::{ServerWorld, FLOOR_Y, SURFACE_Y};

    #[test]
    fn flat_terrain_layers() {
        let world = ServerWorld::default();
        let overworld = world.realm_id("overworld").expect("overworld");
        assert_eq!(world.block_at(overworld, IVec3::new(5, FLOOR_Y - 1, 5)), BlockId::VOID);
        assert_eq!(world.block_at(overworld, IVec3::new(5, FLOOR_Y, 5)), BlockId::RUBBLESTONE);
        assert_eq!(world.block_at(overworld, IVec3::new(-7, SURFACE_Y, 9)), BlockId::VERDANT_TURF);
        assert_eq!(world.block_at(overworld, IVec3::new(-7, SURFACE_Y + 1, 9)), BlockId::AIR);
        assert_eq!(world.surface_height(overworld, 1000, -1000), SURFACE_Y);
        assert_eq!(world.block_at(RealmId(9), IVec3::ZERO), BlockId::VOID);
    }

    #[test]
    fn edits_change_blocks_and_surface() {
        let mut world = ServerWorld::default();
        let realm = world.realm_id("underdeep").expect("underdeep");
        let pillar = [IVec3::new(3, 41, 3), IVec3::new(3, 70, 3)];
        world.set_blocks(realm, &pillar, BlockId::OBSIDIAN);

        assert_eq!(world.block_at(realm, pillar[1]), BlockId::OBSIDIAN);
        assert_eq!(world.surface_height(realm, 3, 3), 70);
        assert_eq!(world.surface_height(realm, 4, 3), SURFACE_Y);
        assert_eq!(world.block_at(RealmId(0), pillar[1]), BlockId::AIR);

        world.set_blocks(realm, &[IVec3::new(8, SURFACE_Y, 8)], BlockId::AIR);
        assert_eq!(world.surface_height(realm, 8, 8), SURFACE_Y - 1);
    }

    #[test]
    fn edits_replay_into_a_fresh_world() {
        let mut world = ServerWorld::default();
        let realm = world.realm_id("overworld").expect("overworld");
        world.set_blocks(realm, &[IVec3::new(0, 41, 0), IVec3::new(1, 41, 0)], BlockId::WAYSTONE_MARKER);
        world.set_blocks(realm, &[IVec3::new(0, 41, 0)], BlockId::AIR);

        let saved = world.edits();
        assert_eq!(saved.edits.len(), 1);
        assert_eq!(saved.edits[0].block, "waystone_marker");

        let mut fresh = ServerWorld::default();
        assert_eq!(fresh.apply_edits(&saved), 1);
        assert_eq!(fresh.block_at(realm, IVec3::new(1, 41, 0)), BlockId::WAYSTONE_MARKER);
        assert_eq!(fresh.block_at(realm, IVec3::new(0, 41, 0)), BlockId::AIR);
    }

    #[test]
    fn blocks_resolve_by_name_or_id() {
        let world = ServerWorld::default();
        assert_eq!(world.resolve_block("obsidian"), Some(BlockId::OBSIDIAN));
        assert_eq!(world.resolve_block("25"), Some(BlockId::WAYSTONE_MARKER));
        assert_eq!(world.resolve_block("9999"), None);
        assert_eq!(world.resolve_block("unobtainium"), None);
    }
}
