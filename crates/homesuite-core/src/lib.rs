//! Core persistence and data handling for homesuite.
//!
//! This crate provides the binary record codec, the directory-per-profile
//! store and its index file, vault encryption, and the exchange-rate and RSS
//! parsers used by every homesuite front end.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod feeds;
pub mod index;
pub mod models;
pub mod session;
pub mod store;
pub mod vault;

pub use codec::{CodecError, Entity, Record, RecordReader, RecordWriter};
pub use crypto::{CryptoError, EncryptedSecret, KdfCost, VaultKey};
pub use error::{StoreError, StoreResult};
pub use index::IndexEntry;
pub use models::{
    Amount, InventoryItem, PasswordEntry, Profile, ProfileId, ProfileMetadata, TaskItem,
    Transaction,
};
pub use session::Session;
pub use store::{LoadReport, ProfileStore, SkippedProfile};
pub use vault::Vault;
