//! # secretstash-inventory
//!
//! What gets backed up: SSM parameters and Secrets Manager secrets.
//!
//! - [`entry`]: the JSON shape of backed-up parameters and secrets
//! - [`ParameterStore`] / [`SecretStore`]: seams over SSM and Secrets Manager
//! - [`Inventory`]: enumerate every entry (or one), then fetch in batches of 10

pub mod entry;
pub mod enumerator;
pub mod memory;
pub mod parameters;
pub mod secrets;
pub mod store;

pub use entry::{ParameterEntry, SecretEntry, SecretListing, Tag};
pub use enumerator::{collect_entries, enumerate_all, fetch_in_batches, Inventory, Selection, BATCH_SIZE};
pub use memory::{MemoryParameterStore, MemorySecretStore};
pub use parameters::{ParameterInventory, SsmParameterStore};
pub use secrets::{SecretInventory, SecretsManagerStore};
pub use store::{Page, ParameterStore, SecretStore};
