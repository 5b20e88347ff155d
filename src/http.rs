//! Transport contract for dispatching intercepted requests upstream.
//!
//! [`RelayHttpClient`] is the relay's only dependency on an HTTP stack. Upstream response
//! bodies are materialized by the transport: laundering and the single 401 retry both need
//! owned bytes, and the request bodies worth streaming (uploads) are exempt routes that
//! never re-enter the relay's rewriting machinery.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
#[cfg(feature = "reqwest")] use crate::request::RequestBody;
use crate::{
	_prelude::*,
	error::TransportError,
	request::{InterceptedRequest, InterceptedResponse},
};

/// Future returned by [`RelayHttpClient::dispatch`].
pub type DispatchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<InterceptedResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing intercepted requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every in-flight interception without additional wrappers. Fetch directives carried on the
/// request are transport metadata; implementations honor them where their stack allows.
pub trait RelayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Dispatches a request upstream, materializing the response.
	fn dispatch(&self, request: InterceptedRequest) -> DispatchFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// reqwest configures redirect policy per client rather than per request; when the page's
/// redirect directives matter, construct the wrapped client accordingly before handing it
/// to the relay.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RelayHttpClient for ReqwestHttpClient {
	fn dispatch(&self, request: InterceptedRequest) -> DispatchFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let url =
				Url::parse(&request.url).map_err(|source| TransportError::InvalidUrl { source })?;
			let mut builder = client.request(request.method, url).headers(request.headers);

			builder = match request.body {
				RequestBody::Empty => builder,
				RequestBody::Buffered(bytes) => builder.body(bytes),
				RequestBody::Streamed(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
			};

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?;

			Ok(InterceptedResponse { status, headers, body })
		})
	}
}
