use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use serde_yaml::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::{Error, Result};

pub const DESCRIPTOR_FILE: &str = "model.yml";

pub fn compute_sha256(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let hash = hasher.finalize();
    Ok(format!("{:x}", hash))
}

/// The model most recently unpacked by the caller: where its `model.yml`
/// lives and what it contained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveModel {
    descriptor: Option<PathBuf>,
    info: Option<Value>,
}

impl ActiveModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points at the descriptor inside an unpacked model directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            descriptor: Some(dir.join(DESCRIPTOR_FILE)),
            info: None,
        }
    }

    pub fn clear(&mut self) {
        self.descriptor = None;
        self.info = None;
    }

    pub fn set_descriptor(&mut self, path: PathBuf) {
        self.descriptor = Some(path);
        self.info = None;
    }

    #[must_use]
    pub fn descriptor_path(&self) -> Option<&Path> {
        self.descriptor.as_deref()
    }

    #[must_use]
    pub fn info(&self) -> Option<&Value> {
        self.info.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.info.is_some()
    }

    /// Parses the descriptor if one is set and present on disk. A missing
    /// file leaves the info empty; one that cannot be opened or parsed
    /// clears the whole state.
    pub fn load_info(&mut self) -> Result<()> {
        let Some(path) = self.descriptor.clone() else {
            return Ok(());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no model descriptor present");
            self.info = None;
            return Ok(());
        }

        match read_descriptor(&path) {
            Ok(info) => {
                self.info = Some(info);
                Ok(())
            }
            Err(error) => {
                self.clear();
                Err(error)
            }
        }
    }
}

fn read_descriptor(path: &Path) -> Result<Value> {
    let file = File::open(path)?;
    serde_yaml::from_reader(BufReader::new(file)).map_err(|source| Error::Descriptor {
        path: path.to_path_buf(),
        source,
    })
}
