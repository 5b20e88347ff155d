//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod lazy;
pub mod memory;

pub use file::FileStore;
pub use lazy::LazyStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialPair};

/// Durable key under which the single credential pair is kept.
pub const CREDENTIAL_KEY: &str = "tokens";

/// Future type returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the durable credential pair.
///
/// Each operation is a single atomic key read/write; the store offers no cross-call
/// coordination. Callers that may race a refresh must re-read after any operation that could
/// have replaced the pair instead of reusing a locally held copy.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the pair stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CredentialPair>>;

	/// Persists or replaces the pair stored under `key` wholesale.
	fn set<'a>(&'a self, key: &'a str, pair: CredentialPair) -> StoreFuture<'a, ()>;

	/// Removes the pair stored under `key`, committing even when nothing was present.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// The storage engine cannot be opened, read, or written.
	#[error("Storage unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
}
