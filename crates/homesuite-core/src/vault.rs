//! PassFort vaults: a profile of password entries plus its unlocked key.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use zxcvbn::{zxcvbn, Score};

use crate::crypto::{CryptoError, EncryptedSecret, KdfCost, VaultKey};
use crate::error::{StoreError, StoreResult};
use crate::models::{PasswordEntry, Profile, ProfileId};
use crate::session::Session;
use crate::store::ProfileStore;

/// Maximum number of hits returned by [`search`].
pub const SEARCH_LIMIT: usize = 10;

/// A search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entry: &'a PasswordEntry,
    /// Match score for sorting.
    pub score: i64,
}

/// Fuzzy search over title, username and URL, best matches first.
pub fn search<'a>(entries: &'a [PasswordEntry], query: &str) -> Vec<SearchHit<'a>> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut hits: Vec<_> = entries
        .iter()
        .filter_map(|entry| {
            let search_text = format!("{} {} {}", entry.title, entry.username, entry.url);
            matcher
                .fuzzy_match(&search_text, query)
                .map(|score| SearchHit { entry, score })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(SEARCH_LIMIT);
    hits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Empty,
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn label(self) -> &'static str {
        match self {
            Strength::Empty => "Empty",
            Strength::VeryWeak => "Very Weak",
            Strength::Weak => "Weak",
            Strength::Fair => "Fair",
            Strength::Strong => "Strong",
            Strength::VeryStrong => "Very Strong",
        }
    }

    pub fn is_weak(self) -> bool {
        self <= Strength::Weak
    }
}

pub fn password_strength(password: &str) -> Strength {
    if password.is_empty() {
        return Strength::Empty;
    }
    match zxcvbn(password, &[]).score() {
        Score::Zero => Strength::VeryWeak,
        Score::One => Strength::Weak,
        Score::Two => Strength::Fair,
        Score::Three => Strength::Strong,
        Score::Four => Strength::VeryStrong,
        _ => Strength::Fair,
    }
}

/// File in a vault's profile directory holding a sealed known value.
pub const KEY_CHECK_FILE: &str = "vault.check";

const KEY_CHECK_PLAINTEXT: &str = "passfort key check";

/// An unlocked vault.
pub struct Vault {
    session: Session<PasswordEntry>,
    key: VaultKey,
}

impl Vault {
    /// Create a new, empty vault protected by `master_password`.
    pub fn create(
        store: ProfileStore,
        name: &str,
        master_password: &str,
        cost: KdfCost,
    ) -> StoreResult<Self> {
        let mut session = Session::<PasswordEntry>::new(store);
        let id = session.create_profile(name)?.id;
        let sealed = VaultKey::derive(master_password, id, cost).and_then(|key| {
            let check = key.seal(KEY_CHECK_PLAINTEXT)?;
            Ok((key, check))
        });
        let written = sealed.map_err(StoreError::from).and_then(|(key, check)| {
            session.store().save_profile_file(id, KEY_CHECK_FILE, &check)?;
            Ok(key)
        });
        match written {
            Ok(key) => Ok(Self { session, key }),
            Err(e) => {
                if let Err(cleanup) = session.delete_profile(id) {
                    tracing::warn!("Could not remove half-created vault {}: {}", id, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Load and unlock an existing vault. The password is verified against
    /// the vault's key check file. Vaults without one are checked against
    /// their first entry and get a key check written on success.
    pub fn open(
        store: ProfileStore,
        id: ProfileId,
        master_password: &str,
        cost: KdfCost,
    ) -> StoreResult<Self> {
        let mut session = Session::<PasswordEntry>::new(store);
        let first = session.select(id)?.records.first().map(|e| e.secret.clone());
        let key = VaultKey::derive(master_password, id, cost)?;

        match session
            .store()
            .load_profile_file::<EncryptedSecret>(id, KEY_CHECK_FILE)
        {
            Ok(check) => {
                if key.open(&check)? != KEY_CHECK_PLAINTEXT {
                    return Err(CryptoError::Decryption.into());
                }
            }
            Err(e) if e.is_not_found() => {
                if let Some(secret) = first {
                    key.open(&secret)?;
                }
                tracing::info!("Vault {} has no key check, writing one", id);
                let check = key.seal(KEY_CHECK_PLAINTEXT)?;
                session.store().save_profile_file(id, KEY_CHECK_FILE, &check)?;
            }
            Err(e) => return Err(e),
        }

        tracing::info!("Unlocked vault {}", id);
        Ok(Self { session, key })
    }

    pub fn profile(&self) -> StoreResult<&Profile<PasswordEntry>> {
        self.session.active().ok_or(StoreError::NoActiveProfile)
    }

    pub fn entries(&self) -> StoreResult<&[PasswordEntry]> {
        self.session.records()
    }

    pub fn add_entry(
        &mut self,
        title: &str,
        username: &str,
        password: &str,
        url: &str,
    ) -> StoreResult<u64> {
        let mut entry = PasswordEntry::new(title, username, self.key.seal(password)?);
        entry.url = url.to_string();
        self.session.add(entry)
    }

    /// Decrypt the password of entry `id`.
    pub fn reveal(&self, id: u64) -> StoreResult<String> {
        let entry = self.session.get(id)?;
        Ok(self.key.open(&entry.secret)?)
    }

    pub fn change_password(&mut self, id: u64, password: &str) -> StoreResult<()> {
        let secret = self.key.seal(password)?;
        self.session.update(id, |entry| entry.replace_secret(secret))
    }

    pub fn remove_entry(&mut self, id: u64) -> StoreResult<PasswordEntry> {
        self.session.remove(id)
    }

    pub fn search(&self, query: &str) -> StoreResult<Vec<SearchHit<'_>>> {
        Ok(search(self.entries()?, query))
    }
}
