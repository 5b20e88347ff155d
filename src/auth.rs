//! Credential-domain models: redacted secrets, the stored pair, and auth wire envelopes.

pub mod envelope;
pub mod pair;
pub mod secret;

pub use envelope::*;
pub use pair::*;
pub use secret::*;
