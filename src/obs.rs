//! Optional observability helpers for relay flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_relay.flow` with the `flow` and
//!   `stage` (call site) fields, plus warnings when the credential store degrades.
//! - Enable `metrics` to increment the `bearer_relay_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Interception flow kinds observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Login/registration laundering flow.
	AuthEntry,
	/// Protected dispatch flow, including the 401 recovery path.
	Protected,
	/// Refresh token exchange.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthEntry => "auth_entry",
			FlowKind::Protected => "protected",
			FlowKind::Refresh => "refresh",
		}
	}

	/// Records one observation of this flow against the global metrics recorder (when
	/// enabled).
	pub fn record(self, outcome: FlowOutcome) {
		#[cfg(feature = "metrics")]
		metrics::counter!(
			"bearer_relay_flow_total",
			"flow" => self.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);

		#[cfg(not(feature = "metrics"))]
		let _ = outcome;
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a relay flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a degraded credential store operation without interrupting the request path.
pub(crate) fn log_store_degraded(stage: &'static str, error: &crate::store::StoreError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(stage, error = %error, "credential store degraded");

	#[cfg(not(feature = "tracing"))]
	let _ = (stage, error);
}
