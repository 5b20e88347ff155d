//! Wire envelopes for the backend's auth endpoints and their laundered forms.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, auth::pair::CredentialPair, error::TransientError};

/// Backend response to a login/registration attempt or a refresh exchange.
#[derive(Clone, Debug)]
pub struct AuthResponseEnvelope {
	/// Whether the backend accepted the attempt; inferred from the HTTP status when the body
	/// does not say.
	pub success: bool,
	/// Human-readable outcome message.
	pub message: String,
	/// Newly issued access token, when the attempt succeeded.
	pub access_token: Option<String>,
	/// Newly issued refresh token, when the attempt succeeded.
	pub refresh_token: Option<String>,
	/// Public user payload forwarded to the application untouched.
	pub user: Option<Value>,
}
impl AuthResponseEnvelope {
	/// Parses an envelope from raw body bytes, reporting the failing JSON path on malformed
	/// input.
	///
	/// Rejections arrive as `{"error": "..."}` with no `success` field; the error text is
	/// folded into `message` and `success` falls back to whether `status` is 2xx, so a
	/// laundered rejection never claims acceptance.
	pub fn parse(bytes: &[u8], status: Option<u16>) -> Result<Self, TransientError> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);
		let raw: RawAuthResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TransientError::AuthResponseParse { source, status })?;

		Ok(Self {
			success: raw
				.success
				.unwrap_or_else(|| status.is_none_or(|code| (200..300).contains(&code))),
			message: raw.message,
			access_token: raw.access_token,
			refresh_token: raw.refresh_token,
			user: raw.user,
		})
	}

	/// Extracts the credential pair, if the envelope carries both tokens.
	///
	/// A lone token counts as none: the store must never hold a partial pair.
	pub fn credential_pair(&self) -> Option<CredentialPair> {
		match (&self.access_token, &self.refresh_token) {
			(Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
			_ => None,
		}
	}

	/// Strips token material, keeping only the application-safe fields.
	pub fn sanitize(self) -> SanitizedAuthResponse {
		SanitizedAuthResponse { success: self.success, message: self.message, user: self.user }
	}
}

/// Wire shape of the auth endpoints. Successes carry tokens; rejections carry a lone
/// `error` string.
#[derive(Deserialize)]
struct RawAuthResponse {
	#[serde(default)]
	success: Option<bool>,
	#[serde(default, alias = "error")]
	message: String,
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	user: Option<Value>,
}

/// Laundered auth response forwarded to the application; token fields are unrepresentable.
#[derive(Clone, Debug, Serialize)]
pub struct SanitizedAuthResponse {
	/// Whether the backend accepted the attempt.
	pub success: bool,
	/// Human-readable outcome message.
	pub message: String,
	/// Public user payload, when the backend supplied one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<Value>,
}
impl SanitizedAuthResponse {
	/// Serializes the laundered body.
	pub fn to_bytes(&self) -> Bytes {
		let mut value =
			serde_json::json!({ "success": self.success, "message": self.message });

		if let Some(user) = &self.user {
			value["user"] = user.clone();
		}

		Bytes::from(value.to_string())
	}
}

/// Body sent to the refresh endpoint.
#[derive(Clone, Serialize)]
pub struct RefreshExchangeRequest<'a> {
	/// Refresh token being exchanged.
	pub refresh_token: &'a str,
}
impl RefreshExchangeRequest<'_> {
	/// Serializes the exchange body.
	pub fn to_bytes(&self) -> Bytes {
		Bytes::from(serde_json::json!({ "refresh_token": self.refresh_token }).to_string())
	}
}
impl Debug for RefreshExchangeRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshExchangeRequest").field("refresh_token", &"<redacted>").finish()
	}
}
