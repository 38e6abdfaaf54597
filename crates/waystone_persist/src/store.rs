use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::record::PortalFile;
use crate::versioning::{decode_portal_file, encode_portal_file};

pub const PORTAL_DATA_FILE: &str = "portals.toml";

/// Synchronous, whole-file storage for the portal registry.
#[derive(Debug, Clone)]
pub struct PortalStore {
    path: PathBuf,
}

impl PortalStore {
    /// Opens (creating if needed) `world_dir` and stores portals in `portals.toml` inside it.
    pub fn open(world_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(world_dir)?;
        Ok(Self::at(world_dir.join(PORTAL_DATA_FILE)))
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the portal file. A missing file is an empty registry.
    pub fn load(&self) -> io::Result<PortalFile> {
        if !self.path.exists() {
            return Ok(PortalFile::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        decode_portal_file(&contents).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {err}", self.path.display()),
            )
        })
    }

    /// Replaces the portal file; the previous file stays intact if writing fails.
    pub fn save(&self, file: &PortalFile) -> io::Result<()> {
        let encoded = encode_portal_file(file)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, encoded)?;
        fs::rename(&staging, &self.path)?;
        debug!("Saved {} portals to {}", file.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{PortalStore, PORTAL_DATA_FILE};
    use crate::record::{PortalFile, PortalRecord};

    fn sample_file() -> PortalFile {
        let mut file = PortalFile::default();
        file.portals.insert(
            "spawn".to_string(),
            PortalRecord {
                realm: "overworld".to_string(),
                anchor: [0, 41, 0],
                target: Some("random".to_string()),
                east_west: true,
                mirrored: false,
            },
        );
        file
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = PortalStore::open(dir.path()).expect("open store");
        assert_eq!(store.path(), dir.path().join(PORTAL_DATA_FILE));
        assert!(store.load().expect("load missing file").is_empty());
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = PortalStore::open(&dir.path().join("world")).expect("open store");

        let file = sample_file();
        store.save(&file).expect("save portals");
        assert_eq!(store.load().expect("load portals"), file);
        assert!(!store.path().with_extension("toml.tmp").exists());
    }

    #[test]
    fn garbage_file_is_invalid_data() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = PortalStore::open(dir.path()).expect("open store");
        fs::write(store.path(), "portals = [[[").expect("write garbage");

        let err = store.load().expect_err("garbage must not load");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = PortalStore::at(dir.path().join("nope").join(PORTAL_DATA_FILE));
        assert!(store.save(&sample_file()).is_err());
    }
}
