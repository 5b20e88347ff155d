//! The interception controller and its per-request state machine.

pub mod refresh;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AuthResponseEnvelope, CredentialPair},
	http::RelayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{InterceptedRequest, InterceptedResponse},
	rewrite,
	route::{RouteClass, RoutePolicy},
	store::{CREDENTIAL_KEY, CredentialStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Relay specialized for the crate's default reqwest transport.
pub type ReqwestRelay = Relay<ReqwestHttpClient>;

/// Orchestrates interception for every outgoing request.
///
/// The relay owns the transport, the credential store, and the route policy; each call to
/// [`Relay::handle_request`] runs one independent pass of the state machine. Credentials are
/// never cached across requests—another interception (refresh, logout) may replace the
/// stored pair at any await point, so the relay re-reads the store whenever the pair could
/// have changed.
pub struct Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// HTTP transport used for every upstream dispatch.
	pub http_client: Arc<C>,
	/// Store owning the durable credential pair.
	pub store: Arc<dyn CredentialStore>,
	/// Route configuration evaluated per request.
	pub policy: RoutePolicy,
	/// Shared metrics recorder for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Creates a relay that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		policy: RoutePolicy,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			policy,
			refresh_metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Handles one intercepted request end to end, returning the response owed to the page.
	///
	/// Terminal for every route class: exempt and unmatched routes are forwarded untouched,
	/// auth entries are laundered, and protected routes are augmented with the stored bearer
	/// credential, recovering from an expired-credential 401 at most once.
	pub async fn handle_request(&self, request: InterceptedRequest) -> Result<InterceptedResponse> {
		match self.policy.classify(&request.method, &request.url) {
			RouteClass::Passthrough | RouteClass::UploadExempt =>
				Ok(self.http_client.dispatch(request).await?),
			RouteClass::AuthEntry => self.run_auth_entry(request).await,
			RouteClass::Protected => self.run_protected(request).await,
		}
	}

	async fn run_auth_entry(&self, request: InterceptedRequest) -> Result<InterceptedResponse> {
		const KIND: FlowKind = FlowKind::AuthEntry;

		let span = FlowSpan::new(KIND, "run_auth_entry");

		KIND.record(FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.http_client.dispatch(request).await?;
				let envelope =
					AuthResponseEnvelope::parse(&response.body, Some(response.status.as_u16()))?;

				if let Some(pair) = envelope.credential_pair() {
					if let Err(error) = self.store.set(CREDENTIAL_KEY, pair).await {
						// The page still gets its laundered response; later protected requests
						// degrade to unauthenticated sends until a login persists.
						obs::log_store_degraded("auth_entry_set", &error);
					}
				}

				let sanitized = envelope.sanitize();

				Ok(response.with_replaced_body(sanitized.to_bytes()))
			})
			.await;

		match &result {
			Ok(_) => KIND.record(FlowOutcome::Success),
			Err(_) => KIND.record(FlowOutcome::Failure),
		}

		result
	}

	async fn run_protected(&self, request: InterceptedRequest) -> Result<InterceptedResponse> {
		const KIND: FlowKind = FlowKind::Protected;

		let span = FlowSpan::new(KIND, "run_protected");

		KIND.record(FlowOutcome::Attempt);

		let result = span.instrument(self.protected_inner(request)).await;

		match &result {
			Ok(_) => KIND.record(FlowOutcome::Success),
			Err(_) => KIND.record(FlowOutcome::Failure),
		}

		result
	}

	async fn protected_inner(&self, request: InterceptedRequest) -> Result<InterceptedResponse> {
		let path = request_path(&request.url);
		let credentials = match self.store.get(CREDENTIAL_KEY).await {
			Ok(credentials) => credentials,
			Err(error) => {
				// Unreadable storage means unauthenticated, not a dead request path.
				obs::log_store_degraded("protected_get", &error);

				None
			},
		};
		let Some(credentials) = credentials else {
			// No local credentials: forward untouched and let the backend reject on its own.
			return Ok(self.http_client.dispatch(request).await?);
		};
		let is_logout = self.policy.is_logout(&path);

		if is_logout {
			// Logout is locally effective before any packet leaves: delete first, send after.
			if let Err(error) = self.store.delete(CREDENTIAL_KEY).await {
				obs::log_store_degraded("logout_delete", &error);
			}
		}

		let retry_source = request.try_clone();
		let response = match self
			.http_client
			.dispatch(self.rewrite_for(request, &credentials, is_logout))
			.await
		{
			Ok(response) => response,
			Err(error) => {
				// One defensive re-dispatch covers transient construction races. A streamed
				// body cannot be replayed, so there the transport error stands.
				let Some(original) = retry_source else { return Err(error.into()) };

				return Ok(self
					.http_client
					.dispatch(self.rewrite_for(original, &credentials, is_logout))
					.await?);
			},
		};

		if response.status != StatusCode::UNAUTHORIZED || self.policy.is_probe(&path) || is_logout
		{
			return Ok(response);
		}

		// Expired-credential path: refresh once, re-read the store, retry once. The retry's
		// outcome is final either way; a failed refresh returns the original 401 verbatim.
		if self.refresh_credentials(Some(credentials.access_token.expose())).await.is_err() {
			return Ok(response);
		}

		let Some(original) = retry_source else { return Ok(response) };
		let Ok(Some(fresh)) = self.store.get(CREDENTIAL_KEY).await else {
			return Ok(response);
		};

		Ok(self.http_client.dispatch(rewrite::attach_bearer(original, &fresh)).await?)
	}

	fn rewrite_for(
		&self,
		request: InterceptedRequest,
		credentials: &CredentialPair,
		is_logout: bool,
	) -> InterceptedRequest {
		if is_logout {
			rewrite::rewrite_logout(request, credentials)
		} else {
			rewrite::attach_bearer(request, credentials)
		}
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestHttpClient> {
	/// Creates a relay with the crate's default reqwest transport.
	pub fn new(store: Arc<dyn CredentialStore>, policy: RoutePolicy) -> Self {
		Self::with_http_client(store, policy, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			policy: self.policy.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay").field("policy", &self.policy).finish()
	}
}

fn request_path(url: &str) -> String {
	Url::parse(url).map(|url| url.path().to_owned()).unwrap_or_default()
}
