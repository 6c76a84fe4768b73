//! The index file lists every known profile id and its storage path.
//!
//! Layout: `i32 count`, then `count` entries of `{ u64 id, string path }`.
//! Appends patch the count in place and write the new entry at the end,
//! which leaves a count/content mismatch if interrupted. Rewrites replace the
//! whole file at once.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec::{self, Record, RecordReader, RecordWriter};
use crate::error::{StoreError, StoreResult};
use crate::models::ProfileId;
use crate::store::write_atomic;

/// One `(id, path)` pair. The path is relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: ProfileId,
    pub path: String,
}

impl Record for IndexEntry {
    fn encode(&self, w: &mut RecordWriter) -> codec::Result<()> {
        w.write_u64(self.id.0);
        w.write_str(&self.path)
    }

    fn decode(r: &mut RecordReader<'_>) -> codec::Result<Self> {
        Ok(Self {
            id: ProfileId(r.read_u64()?),
            path: r.read_string()?,
        })
    }
}

/// Read all entries. A missing file is an empty index, not an error.
pub fn read(path: &Path) -> StoreResult<Vec<IndexEntry>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No index at {}, treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };
    codec::decode_list_from_slice(&bytes).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Add one entry, creating the file if needed. Duplicates are not detected.
pub fn append(path: &Path, entry: &IndexEntry) -> StoreResult<()> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return rewrite(path, std::slice::from_ref(entry));
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let count = read_count(&mut file).map_err(|e| match e {
        CountError::Io(e) => StoreError::io(path, e),
        CountError::Format(source) => StoreError::Format {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let mut w = RecordWriter::new();
    entry
        .encode(&mut w)
        .map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;
    let new_count = count.checked_add(1).ok_or_else(|| StoreError::Format {
        path: path.to_path_buf(),
        source: codec::CodecError::TooLong {
            what: "index",
            len: count as usize,
        },
    })?;

    (|| -> io::Result<()> {
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&new_count.to_le_bytes())?;
        file.seek(SeekFrom::End(0))?;
        file.write_all(w.as_bytes())?;
        file.sync_all()
    })()
    .map_err(|e| StoreError::io(path, e))?;

    tracing::debug!("Appended profile {} to index ({} entries)", entry.id, new_count);
    Ok(())
}

/// Replace the file with exactly `entries`.
pub fn rewrite(path: &Path, entries: &[IndexEntry]) -> StoreResult<()> {
    let bytes = codec::encode_list_to_vec(entries).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &bytes)?;
    tracing::debug!("Rewrote index with {} entries", entries.len());
    Ok(())
}

enum CountError {
    Io(io::Error),
    Format(codec::CodecError),
}

fn read_count(file: &mut File) -> Result<i32, CountError> {
    let mut buf = [0u8; 4];
    file.seek(SeekFrom::Start(0)).map_err(CountError::Io)?;
    match file.read_exact(&mut buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(CountError::Format(codec::CodecError::UnexpectedEof {
                needed: 4,
                remaining: 0,
            }));
        }
        Err(e) => return Err(CountError::Io(e)),
    }
    let count = i32::from_le_bytes(buf);
    if count < 0 {
        return Err(CountError::Format(codec::CodecError::NegativeCount(count)));
    }
    Ok(count)
}
