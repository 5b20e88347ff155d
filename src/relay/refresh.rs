//! Refresh exchange orchestration with a single-flight guard.
//!
//! The relay exposes [`Relay::refresh_credentials`] for the 401 recovery path and
//! [`Relay::handle_refresh_signal`] for the hosting page's out-of-band "extend my session"
//! message. Exchanges are serialized by a process-wide guard; a 401 handler that waited out
//! another handler's exchange observes the rotated pair and skips its own round trip. Any
//! failure leaves the existing (stale) pair untouched so a transient backend hiccup never
//! silently logs the user out.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use http::header::CONTENT_TYPE;
// self
use crate::{
	_prelude::*,
	auth::{AuthResponseEnvelope, CredentialPair, RefreshExchangeRequest},
	error::TransientError,
	http::RelayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::Relay,
	request::InterceptedRequest,
	store::CREDENTIAL_KEY,
};

impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Exchanges the stored refresh token for a new credential pair and persists it.
	///
	/// Single-flight: when `observed_access` carries the access token a 401 handler just
	/// watched fail and the stored pair has already rotated past it, the exchange is skipped
	/// and the fresh pair returned—N concurrent 401s cost one round trip. Passing `None`
	/// forces an exchange.
	///
	/// No internal retry, no backoff. On failure the stale pair stays in the store.
	pub async fn refresh_credentials(
		&self,
		observed_access: Option<&str>,
	) -> Result<CredentialPair> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_credentials");

		KIND.record(FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;
				let current = self
					.store
					.get(CREDENTIAL_KEY)
					.await
					.map_err(|err| {
						self.refresh_metrics.record_failure();

						Error::from(err)
					})?
					.ok_or_else(|| {
						self.refresh_metrics.record_failure();

						Error::MissingCredentials
					})?;

				if let Some(observed) = observed_access
					&& current.access_token.expose() != observed
				{
					// Another interception rotated the pair while we waited on the guard.
					self.refresh_metrics.record_success();

					return Ok(current);
				}

				let exchange =
					RefreshExchangeRequest { refresh_token: current.refresh_token.expose() };
				let mut request =
					InterceptedRequest::new(Method::POST, self.policy.refresh_url().as_str())
						.with_body(exchange.to_bytes());

				request.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

				let response = self.http_client.dispatch(request).await.map_err(|err| {
					self.refresh_metrics.record_failure();

					Error::from(err)
				})?;
				let status = response.status.as_u16();

				if !response.status.is_success() {
					self.refresh_metrics.record_failure();

					return Err(TransientError::RefreshEndpoint {
						message: response.status.to_string(),
						status: Some(status),
					}
					.into());
				}

				let envelope =
					AuthResponseEnvelope::parse(&response.body, Some(status)).map_err(|err| {
						self.refresh_metrics.record_failure();

						Error::from(err)
					})?;
				let pair = envelope.credential_pair().ok_or_else(|| {
					self.refresh_metrics.record_failure();

					Error::from(TransientError::IncompleteCredentialPair { status: Some(status) })
				})?;

				self.store.set(CREDENTIAL_KEY, pair.clone()).await.map_err(|err| {
					self.refresh_metrics.record_failure();

					Error::from(err)
				})?;
				self.refresh_metrics.record_success();

				Ok(pair)
			})
			.await;

		match &result {
			Ok(_) => KIND.record(FlowOutcome::Success),
			Err(_) => KIND.record(FlowOutcome::Failure),
		}

		result
	}

	/// Proactively refreshes the session, typically after a full page reload.
	///
	/// A no-op when no credential pair exists. There is no response to construct; the new
	/// pair simply lands in the store for the next protected request.
	pub async fn handle_refresh_signal(&self) -> Result<()> {
		match self.store.get(CREDENTIAL_KEY).await {
			Ok(Some(_)) => self.refresh_credentials(None).await.map(|_| ()),
			Ok(None) => Ok(()),
			Err(error) => {
				obs::log_store_degraded("refresh_signal", &error);

				Ok(())
			},
		}
	}
}
