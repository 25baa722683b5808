//! Stage labels plus the span and counter hooks shared by authenticators and interceptors.
//!
//! Nothing here costs anything unless a feature turns it on. With `tracing`, every stage
//! runs inside an `sdk_pipeline.stage` span and unusable backoff headers are logged at
//! `warn`. With `metrics`, each stage outcome bumps `sdk_pipeline_stage_total`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use tracing::{stage_debug, stage_warn};

// self
use crate::_prelude::*;

/// Points in a call where the pipeline reports progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Authenticator applying credentials to a request.
	Authenticate,
	/// Authenticator fetching a fresh token from an issuance endpoint.
	TokenRequest,
	/// Rate-limit interceptor resending a throttled request.
	RateLimitRetry,
}
impl Stage {
	/// Label used for the `stage` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Authenticate => "authenticate",
			Stage::TokenRequest => "token_request",
			Stage::RateLimitRetry => "rate_limit_retry",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How far a stage got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// The stage started.
	Attempt,
	/// The stage completed.
	Success,
	/// The stage failed or gave up.
	Failure,
}
impl StageOutcome {
	/// Label used for the `outcome` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_match_display() {
		assert_eq!(Stage::RateLimitRetry.to_string(), "rate_limit_retry");
		assert_eq!(Stage::TokenRequest.as_str(), "token_request");
		assert_eq!(StageOutcome::Attempt.to_string(), StageOutcome::Attempt.as_str());
	}
}
