//! Entity records and the profiles that own them.

mod amount;
mod inventory;
mod password;
mod profile;
mod task;
mod transaction;

pub use amount::{Amount, ParseAmountError, AMOUNT_SCALE};
pub use inventory::InventoryItem;
pub use password::PasswordEntry;
pub use profile::{Profile, ProfileId, ProfileMetadata};
pub use task::{sort_for_display, TaskItem};
pub use transaction::{summarize, Summary, Transaction};
