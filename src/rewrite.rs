//! Request rewriting: bearer attachment and the logout body injection.
//!
//! Rewrites are infallible by contract. When a rewrite cannot be constructed—an access token
//! that is not a valid header value, a body that cannot be re-serialized—the original request
//! is returned unmodified and the controller proceeds with an unauthenticated send.

// crates.io
use http::header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	request::{InterceptedRequest, RequestBody},
};

/// Returns an equivalent request carrying `Authorization: Bearer <access>`.
///
/// The bearer header is appended, never replacing a pre-existing `Authorization` value.
/// Method, body, and directives pass through untouched.
pub fn attach_bearer(
	mut request: InterceptedRequest,
	credentials: &CredentialPair,
) -> InterceptedRequest {
	let Ok(value) = bearer_value(credentials) else { return request };

	request.headers.append(AUTHORIZATION, value);

	request
}

/// Rewrites a logout request so the backend can revoke the refresh token.
///
/// The body is materialized as JSON with the refresh token injected; fields of an existing
/// JSON-object body are preserved. A streamed body cannot be merged synchronously and is
/// replaced by the bare refresh payload—logout bodies are empty or tiny JSON in practice.
pub fn rewrite_logout(
	request: InterceptedRequest,
	credentials: &CredentialPair,
) -> InterceptedRequest {
	let mut request = attach_bearer(request, credentials);
	let mut fields = match &request.body {
		RequestBody::Buffered(bytes) =>
			serde_json::from_slice::<Map<String, Value>>(bytes).unwrap_or_default(),
		_ => Map::new(),
	};

	fields.insert(
		"refresh_token".into(),
		Value::String(credentials.refresh_token.expose().into()),
	);

	request.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	request.body = RequestBody::Buffered(Bytes::from(Value::Object(fields).to_string()));

	request
}

fn bearer_value(credentials: &CredentialPair) -> Result<HeaderValue, InvalidHeaderValue> {
	let mut value =
		HeaderValue::from_str(&format!("Bearer {}", credentials.access_token.expose()))?;

	value.set_sensitive(true);

	Ok(value)
}
