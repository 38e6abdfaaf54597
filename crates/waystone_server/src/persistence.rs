use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BLOCK_EDIT_FILE: &str = "blocks.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockEditFile {
    #[serde(default)]
    pub edits: Vec<BlockEditRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEditRecord {
    pub realm: String,
    pub pos: [i32; 3],
    pub block: String,
}

/// Terrain edits live beside the portal file so portal frames survive restarts.
pub struct PersistenceLayer {
    path: PathBuf,
}

impl PersistenceLayer {
    pub fn open(world_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(world_dir)?;
        Ok(Self {
            path: world_dir.join(BLOCK_EDIT_FILE),
        })
    }

    pub fn load_edits(&self) -> io::Result<BlockEditFile> {
        if !self.path.exists() {
            return Ok(BlockEditFile::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        toml::from_str(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize {}: {e}", self.path.display()),
            )
        })
    }

    pub fn save_edits(&self, file: &BlockEditFile) -> io::Result<()> {
        let serialized = toml::to_string_pretty(file).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize block edits: {e}"),
            )
        })?;
        fs::write(&self.path, serialized)?;
        debug!("Saved {} block edits to {}", file.edits.len(), self.path.display());
        Ok(())
    }
}
