//! Error type for profile storage.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::CodecError;
use crate::crypto::CryptoError;
use crate::models::ProfileId;

/// Storage failures, split so callers can tell an expected miss from
/// corruption or a failing disk.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed data in {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Profile directory already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    #[error("No profile is selected")]
    NoActiveProfile,

    #[error("Record {id} not found in profile {profile}")]
    RecordNotFound { profile: ProfileId, id: u64 },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Classify an I/O error, mapping `NotFound` to [`StoreError::NotFound`].
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
