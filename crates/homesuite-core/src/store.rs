//! Directory-per-profile storage.
//!
//! ```text
//! <root>/profiles.idx          index of all profiles
//! <root>/<id>/profile.meta     name and creation time
//! <root>/<id>/records.dat      counted list of entity records
//! ```
//!
//! Every save rewrites its file wholesale through a temporary file that is
//! renamed over the target. Creating a profile touches three files with no
//! transaction around them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::codec::{self, Record};
use crate::error::{StoreError, StoreResult};
use crate::index::{self, IndexEntry};
use crate::models::{Profile, ProfileId, ProfileMetadata};

pub const INDEX_FILE: &str = "profiles.idx";
pub const METADATA_FILE: &str = "profile.meta";
pub const RECORDS_FILE: &str = "records.dat";

/// How many fresh ids to try before giving up on a colliding directory.
const MAX_ID_ATTEMPTS: usize = 16;

/// Monotonic profile id source.
///
/// Ids start from the current time in milliseconds but never repeat or go
/// backwards within a process, even when several profiles are created in the
/// same millisecond or the clock is adjusted.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Generator whose next id is strictly greater than `floor`.
    pub fn starting_after(floor: u64) -> Self {
        Self {
            last: AtomicU64::new(floor),
        }
    }

    pub fn next(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// A profile that could not be loaded by [`ProfileStore::load_all`].
#[derive(Debug)]
pub struct SkippedProfile {
    pub id: ProfileId,
    pub path: PathBuf,
    pub error: StoreError,
}

/// Result of a best-effort load of every indexed profile.
#[derive(Debug)]
pub struct LoadReport<R> {
    pub profiles: Vec<Profile<R>>,
    pub skipped: Vec<SkippedProfile>,
}

/// Owns a root directory of profiles and its index.
#[derive(Debug)]
pub struct ProfileStore {
    root: PathBuf,
    ids: IdGenerator,
}

impl ProfileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;

        let index_path = root.join(INDEX_FILE);
        let floor = match index::read(&index_path) {
            Ok(entries) => entries.iter().map(|e| e.id.0).max().unwrap_or(0),
            Err(e) => {
                tracing::warn!("Could not read index {}: {}", index_path.display(), e);
                0
            }
        };

        tracing::debug!("Opened profile store at {}", root.display());
        Ok(Self {
            root,
            ids: IdGenerator::starting_after(floor),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn profile_dir(&self, id: ProfileId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// All `(id, path)` pairs in the index.
    pub fn list(&self) -> StoreResult<Vec<IndexEntry>> {
        index::read(&self.index_path())
    }

    /// Create an empty profile: directory, empty record list, metadata, index entry.
    pub fn create_profile<R: Record>(&self, name: &str) -> StoreResult<Profile<R>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let id = self.claim_directory()?;
        let profile = Profile {
            id,
            name: name.to_string(),
            created_at: codec::now(),
            records: Vec::new(),
        };
        self.save_entities(&profile)?;
        self.save_metadata(&profile)?;
        index::append(
            &self.index_path(),
            &IndexEntry {
                id,
                path: id.to_string(),
            },
        )?;

        tracing::info!("Created profile {} ({})", profile.name, id);
        Ok(profile)
    }

    fn claim_directory(&self) -> StoreResult<ProfileId> {
        let mut collided = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = ProfileId(self.ids.next());
            let dir = self.profile_dir(id);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::warn!("Profile directory {} already exists, retrying", dir.display());
                    collided = Some(dir);
                }
                Err(e) => return Err(StoreError::io(&dir, e)),
            }
        }
        Err(StoreError::AlreadyExists {
            path: collided.unwrap_or_else(|| self.root.clone()),
        })
    }

    /// Load one profile by id from its default directory.
    pub fn load_profile<R: Record>(&self, id: ProfileId) -> StoreResult<Profile<R>> {
        self.load_dir(id, &self.profile_dir(id))
    }

    fn load_dir<R: Record>(&self, id: ProfileId, dir: &Path) -> StoreResult<Profile<R>> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        let meta: ProfileMetadata =
            read_file(&dir.join(METADATA_FILE), codec::decode_from_slice)?;
        let records: Vec<R> = read_file(&dir.join(RECORDS_FILE), codec::decode_list_from_slice)?;

        tracing::debug!("Loaded profile {} with {} records", id, records.len());
        Ok(Profile {
            id,
            name: meta.name,
            created_at: meta.created_at,
            records,
        })
    }

    /// Load every indexed profile, skipping (and logging) the ones that fail.
    pub fn load_all<R: Record>(&self) -> StoreResult<LoadReport<R>> {
        let mut report = LoadReport {
            profiles: Vec::new(),
            skipped: Vec::new(),
        };

        for entry in self.list()? {
            let dir = self.root.join(&entry.path);
            match self.load_dir(entry.id, &dir) {
                Ok(profile) => report.profiles.push(profile),
                Err(error) => {
                    tracing::warn!("Skipping profile {}: {}", entry.id, error);
                    report.skipped.push(SkippedProfile {
                        id: entry.id,
                        path: dir,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Loaded {} profiles ({} skipped)",
            report.profiles.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Overwrite the record list file with the profile's current records.
    pub fn save_entities<R: Record>(&self, profile: &Profile<R>) -> StoreResult<()> {
        let path = self.profile_dir(profile.id).join(RECORDS_FILE);
        let bytes = codec::encode_list_to_vec(&profile.records).map_err(|source| {
            StoreError::Format {
                path: path.clone(),
                source,
            }
        })?;
        write_atomic(&path, &bytes)?;
        tracing::debug!("Saved {} records for profile {}", profile.records.len(), profile.id);
        Ok(())
    }

    /// Overwrite the metadata file.
    pub fn save_metadata<R>(&self, profile: &Profile<R>) -> StoreResult<()> {
        let path = self.profile_dir(profile.id).join(METADATA_FILE);
        let bytes = codec::encode_to_vec(&profile.metadata()).map_err(|source| {
            StoreError::Format {
                path: path.clone(),
                source,
            }
        })?;
        write_atomic(&path, &bytes)
    }

    /// Write an extra single-record file into a profile's directory.
    pub fn save_profile_file<T: Record>(
        &self,
        id: ProfileId,
        file_name: &str,
        record: &T,
    ) -> StoreResult<()> {
        let path = self.profile_dir(id).join(file_name);
        let bytes = codec::encode_to_vec(record).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes)
    }

    /// Read a file written by [`ProfileStore::save_profile_file`].
    pub fn load_profile_file<T: Record>(&self, id: ProfileId, file_name: &str) -> StoreResult<T> {
        read_file(
            &self.profile_dir(id).join(file_name),
            codec::decode_from_slice,
        )
    }

    /// Remove a profile's directory and drop it from the index.
    pub fn delete_profile(&self, id: ProfileId) -> StoreResult<()> {
        let index_path = self.index_path();
        let mut entries = index::read(&index_path)?;
        let dir = entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| self.root.join(&e.path))
            .unwrap_or_else(|| self.profile_dir(id));
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let indexed = entries.len() != before;

        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && indexed => {
                tracing::warn!("Profile {} was indexed but had no directory", id);
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        }

        if indexed {
            index::rewrite(&index_path, &entries)?;
        }
        tracing::info!("Deleted profile {}", id);
        Ok(())
    }
}

fn read_file<T>(
    path: &Path,
    decode: impl FnOnce(&[u8]) -> codec::Result<T>,
) -> StoreResult<T> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    decode(&bytes).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `bytes` via a synced temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
