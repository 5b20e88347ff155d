//! The durable credential pair and its completeness invariant.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Access/refresh bearer token tuple issued by the backend.
///
/// A pair only exists in complete form: both secrets are required at construction and the
/// store replaces the pair wholesale. A partial pair is unrepresentable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Access token attached to protected requests.
	pub access_token: TokenSecret,
	/// Refresh token exchanged for a replacement pair.
	pub refresh_token: TokenSecret,
	/// Instant the pair was obtained from the backend.
	#[serde(default = "OffsetDateTime::now_utc")]
	pub issued_at: OffsetDateTime,
}
impl CredentialPair {
	/// Builds a pair stamped with the current clock.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			issued_at: OffsetDateTime::now_utc(),
		}
	}
}
