//! Explicit session state: the store plus the currently selected profile.
//!
//! Every mutating call saves the whole record list before returning.

use crate::codec::Entity;
use crate::error::{StoreError, StoreResult};
use crate::index::IndexEntry;
use crate::models::{Profile, ProfileId};
use crate::store::{LoadReport, ProfileStore};

pub struct Session<R> {
    store: ProfileStore,
    active: Option<Profile<R>>,
}

impl<R: Entity> Session<R> {
    pub fn new(store: ProfileStore) -> Self {
        Self {
            store,
            active: None,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn profiles(&self) -> StoreResult<Vec<IndexEntry>> {
        self.store.list()
    }

    pub fn load_all(&self) -> StoreResult<LoadReport<R>> {
        self.store.load_all()
    }

    /// Create a profile and make it the active one.
    pub fn create_profile(&mut self, name: &str) -> StoreResult<&Profile<R>> {
        let profile = self.store.create_profile(name)?;
        Ok(&*self.active.insert(profile))
    }

    /// Load a profile from disk and make it the active one.
    pub fn select(&mut self, id: ProfileId) -> StoreResult<&Profile<R>> {
        let profile = self.store.load_profile(id)?;
        Ok(&*self.active.insert(profile))
    }

    pub fn active(&self) -> Option<&Profile<R>> {
        self.active.as_ref()
    }

    pub fn close(&mut self) -> Option<Profile<R>> {
        self.active.take()
    }

    pub fn records(&self) -> StoreResult<&[R]> {
        self.active
            .as_ref()
            .map(|p| p.records.as_slice())
            .ok_or(StoreError::NoActiveProfile)
    }

    pub fn get(&self, id: u64) -> StoreResult<&R> {
        let profile = self.active.as_ref().ok_or(StoreError::NoActiveProfile)?;
        profile.find(id).ok_or(StoreError::RecordNotFound {
            profile: profile.id,
            id,
        })
    }

    /// Append a record with a fresh id and save. Returns the id.
    pub fn add(&mut self, record: R) -> StoreResult<u64> {
        let profile = self.active.as_mut().ok_or(StoreError::NoActiveProfile)?;
        let id = profile.push(record);
        if let Err(e) = self.store.save_entities(profile) {
            profile.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Modify a record in place and save. A failed save restores the old record.
    pub fn update(&mut self, id: u64, edit: impl FnOnce(&mut R)) -> StoreResult<()>
    where
        R: Clone,
    {
        let profile = self.active.as_mut().ok_or(StoreError::NoActiveProfile)?;
        let profile_id = profile.id;
        let record = profile.find_mut(id).ok_or(StoreError::RecordNotFound {
            profile: profile_id,
            id,
        })?;
        let before = record.clone();
        edit(record);
        // The edit closure must not change the id.
        record.set_id(id);
        if let Err(e) = self.store.save_entities(profile) {
            if let Some(record) = profile.find_mut(id) {
                *record = before;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a record and save. Returns the removed record. A failed save
    /// puts it back in its old position.
    pub fn remove(&mut self, id: u64) -> StoreResult<R> {
        let profile = self.active.as_mut().ok_or(StoreError::NoActiveProfile)?;
        let index = profile
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(StoreError::RecordNotFound {
                profile: profile.id,
                id,
            })?;
        let removed = profile.records.remove(index);
        if let Err(e) = self.store.save_entities(profile) {
            profile.records.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    pub fn rename(&mut self, name: &str) -> StoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let profile = self.active.as_mut().ok_or(StoreError::NoActiveProfile)?;
        profile.name = name.to_string();
        self.store.save_metadata(profile)
    }

    /// Delete a profile from disk, closing it first if it is active.
    pub fn delete_profile(&mut self, id: ProfileId) -> StoreResult<()> {
        if self.active.as_ref().is_some_and(|p| p.id == id) {
            self.active = None;
        }
        self.store.delete_profile(id)
    }
}
