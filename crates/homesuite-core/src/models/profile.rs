//! Profiles own an ordered list of entity records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::codec::{Entity, Record, RecordReader, RecordWriter, Result};

/// Identifier of a profile directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(ProfileId)
    }
}

/// Contents of the metadata file: display name and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Record for ProfileMetadata {
    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.write_str(&self.name)?;
        w.write_timestamp(&self.created_at);
        Ok(())
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            name: r.read_string()?,
            created_at: r.read_timestamp()?,
        })
    }
}

/// A named collection of records, loaded and saved as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile<R> {
    pub id: ProfileId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<R>,
}

impl<R> Profile<R> {
    pub fn metadata(&self) -> ProfileMetadata {
        ProfileMetadata {
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

impl<R: Entity> Profile<R> {
    /// One past the largest record id in use, starting at 1.
    pub fn next_record_id(&self) -> u64 {
        self.records
            .iter()
            .map(Entity::id)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    pub fn find(&self, id: u64) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    /// Assign the next free id and append. Returns the id.
    pub fn push(&mut self, mut record: R) -> u64 {
        let id = self.next_record_id();
        record.set_id(id);
        self.records.push(record);
        id
    }

    pub fn remove(&mut self, id: u64) -> Option<R> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }
}
