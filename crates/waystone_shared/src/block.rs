use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const RUBBLESTONE: Self = Self(1);
    pub const LOAM: Self = Self(2);
    pub const VERDANT_TURF: Self = Self(3);
    pub const TIMBER_LOG: Self = Self(4);
    pub const OBSIDIAN: Self = Self(5);
    pub const STILL_WATER: Self = Self(6);
    pub const FLOWING_WATER_LEVEL1: Self = Self(7);
    pub const FLOWING_WATER_LEVEL7: Self = Self(13);
    pub const LAVA_SOURCE: Self = Self(14);
    pub const FLOWING_LAVA_LEVEL1: Self = Self(15);
    pub const FLOWING_LAVA_LEVEL7: Self = Self(21);
    pub const CACTUS: Self = Self(22);
    pub const COBWEB: Self = Self(23);
    pub const FIRE: Self = Self(24);
    pub const WAYSTONE_MARKER: Self = Self(25);
    pub const PORTAL_SURFACE_EW: Self = Self(26);
    pub const PORTAL_SURFACE_NS: Self = Self(27);
    pub const VOID: Self = Self(28);
    pub const SAND: Self = Self(29);
    pub const CRYSTAL_PANE: Self = Self(30);
}

/// Still water and every flowing level.
pub fn is_water_block(block: BlockId) -> bool {
    (BlockId::STILL_WATER.0..=BlockId::FLOWING_WATER_LEVEL7.0).contains(&block.0)
}

/// Lava source and every flowing level.
pub fn is_lava_block(block: BlockId) -> bool {
    (BlockId::LAVA_SOURCE.0..=BlockId::FLOWING_LAVA_LEVEL7.0).contains(&block.0)
}

pub fn is_cactus(block: BlockId) -> bool {
    block == BlockId::CACTUS
}

pub fn is_cobweb(block: BlockId) -> bool {
    block == BlockId::COBWEB
}

pub fn is_fire_block(block: BlockId) -> bool {
    block == BlockId::FIRE
}

pub fn is_build_marker(block: BlockId) -> bool {
    block == BlockId::WAYSTONE_MARKER
}

pub fn is_portal_surface(block: BlockId) -> bool {
    block == BlockId::PORTAL_SURFACE_EW || block == BlockId::PORTAL_SURFACE_NS
}

pub fn is_void(block: BlockId) -> bool {
    block == BlockId::VOID
}

/// Blocks a traveler must never be dropped into or onto.
pub fn is_hazard(block: BlockId) -> bool {
    is_water_block(block)
        || is_lava_block(block)
        || is_cactus(block)
        || is_cobweb(block)
        || is_fire_block(block)
        || is_portal_surface(block)
        || is_void(block)
}

/// Air gives no footing, so it is unsafe to stand on even though it is not a hazard.
pub fn is_unsafe_footing(block: BlockId) -> bool {
    block == BlockId::AIR || is_hazard(block)
}

/// Name table for block ids; ids are handed out in registration order.
#[derive(Default, Debug, Clone)]
pub struct BlockRegistry {
    names: Vec<String>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering a known name hands back its existing id.
    pub fn register(&mut self, name: &str) -> BlockId {
        if let Some(existing) = self.by_name.get(name) {
            return *existing;
        }

        let id = BlockId(u16::try_from(self.names.len()).unwrap_or(u16::MAX));
        self.by_name.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: BlockId) -> Option<&str> {
        self.names.get(usize::from(id.0)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub fn register_default_blocks() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    for name in ["air", "rubblestone", "loam", "verdant_turf", "timber_log", "obsidian", "still_water"] {
        registry.register(name);
    }
    for level in 1..=7 {
        registry.register(&format!("flowing_water_{level}"));
    }
    registry.register("lava_source");
    for level in 1..=7 {
        registry.register(&format!("flowing_lava_{level}"));
    }
    for name in [
        "cactus",
        "cobweb",
        "fire",
        "waystone_marker",
        "portal_surface_ew",
        "portal_surface_ns",
        "void",
        "sand",
        "crystal_pane",
    ] {
        registry.register(name);
    }
    registry
}
