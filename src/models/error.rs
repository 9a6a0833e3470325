use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("model '{name}' is not in the catalog")]
    NotFound { name: String },

    #[error("unsupported operating system '{platform}'; please open an issue at https://github.com/PhysiBoSS/PhysiBoSS/issues/")]
    UnsupportedPlatform { platform: String },

    #[error("model '{model}' has no published release")]
    NoRelease { model: String },

    #[error("model '{model}' has no release asset ending in '{suffix}' for this operating system")]
    NoAsset { model: String, suffix: String },

    #[error("model '{model}' has {} release assets ending in '{suffix}': {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousAsset {
        model: String,
        suffix: String,
        candidates: Vec<String>,
    },

    #[error("failed to unpack archive {}", .archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse model descriptor {}", .path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Extraction failures leave a half-written target directory behind and
    /// are not meant to be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Extraction { .. })
    }
}
