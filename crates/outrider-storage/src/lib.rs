//! Object storage discovery and secret retrieval
//!
//! Work units are discovered fresh on every invocation by listing the
//! common prefixes under the dataset's base prefix; there is no caching
//! and no persisted inventory. Secrets (the bucket name, API credentials
//! for collaborators) are fetched through a component-owned TTL cache; a
//! miss simply re-fetches, and concurrent refreshes are harmless.

pub mod error;
pub mod object_store;
pub mod secrets;

pub use error::{Result, StorageError};
pub use object_store::{work_units_from_prefixes, ObjectStore, RestObjectStore, RestStorageConfig};
pub use secrets::{RestSecretStore, SecretCache, SecretStore};
