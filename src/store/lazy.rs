//! Lazily connected store wrapper sharing a single pending open across callers.

// std
use std::path::PathBuf;
// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	obs,
	store::{CredentialStore, FileStore, StoreError, StoreFuture},
};

/// Future produced by a [`LazyStore`] factory.
pub type OpenFuture =
	Pin<Box<dyn Future<Output = Result<Arc<dyn CredentialStore>, StoreError>> + Send>>;

/// Factory invoked at most once to open the backing store.
pub type StoreFactory = Box<dyn Fn() -> OpenFuture + Send + Sync>;

/// Defers opening the backing store until first use.
///
/// The connection is established once and memoized for the process lifetime; concurrent
/// callers arriving before the first open completes await the same pending attempt instead
/// of racing to create duplicates. Reads against an unavailable backend degrade to absent,
/// so the interception path treats the user as unauthenticated rather than failing; writes
/// surface the storage error to the caller.
pub struct LazyStore {
	cell: OnceCell<Arc<dyn CredentialStore>>,
	factory: StoreFactory,
}
impl LazyStore {
	/// Creates a store that opens via `factory` on first use.
	pub fn new(factory: StoreFactory) -> Self {
		Self { cell: OnceCell::new(), factory }
	}

	/// Convenience constructor for a lazily opened [`FileStore`] at `path`.
	pub fn file(path: impl Into<PathBuf>) -> Self {
		let path = path.into();

		Self::new(Box::new(move || {
			let path = path.clone();

			Box::pin(async move {
				FileStore::open(path).map(|store| Arc::new(store) as Arc<dyn CredentialStore>)
			})
		}))
	}

	async fn backend(&self) -> Result<&Arc<dyn CredentialStore>, StoreError> {
		self.cell.get_or_try_init(|| (self.factory)()).await
	}
}
impl CredentialStore for LazyStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CredentialPair>> {
		Box::pin(async move {
			let backend = match self.backend().await {
				Ok(backend) => backend,
				Err(error) => {
					obs::log_store_degraded("open", &error);

					return Ok(None);
				},
			};

			match backend.get(key).await {
				Ok(pair) => Ok(pair),
				Err(error) => {
					obs::log_store_degraded("get", &error);

					Ok(None)
				},
			}
		})
	}

	fn set<'a>(&'a self, key: &'a str, pair: CredentialPair) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.backend().await?.set(key, pair).await })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.backend().await?.delete(key).await })
	}
}
impl Debug for LazyStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LazyStore").field("connected", &self.cell.get().is_some()).finish()
	}
}
