//! HTTP 429 handling: wait for the advertised (or default) interval, re-authenticate, and
//! resend until the call succeeds, fails differently, or exhausts its retry budget.

// self
use crate::{
	_prelude::*,
	auth::Authenticator,
	http::{HeaderMap, Request, Response, StatusCode, header_str},
	interceptor::{InterceptFuture, Interceptor, Next},
	obs::{self, Stage, StageOutcome, StageSpan, stage_debug, stage_warn},
};

/// `RateLimit-Reset` response header; takes precedence over `Retry-After`.
pub const RATE_LIMIT_RESET: &str = "ratelimit-reset";
/// `Retry-After` response header.
pub const RETRY_AFTER: &str = "retry-after";

/// Retry settings for throttled calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
	/// Wait used when the response carries no usable backoff header.
	pub default_interval: Duration,
	/// Maximum number of resends per call; `None` retries indefinitely.
	///
	/// A call that keeps being throttled sends `max_retries + 1` requests in total.
	pub max_retries: Option<u32>,
}
impl RateLimitConfig {
	/// Creates an unbounded configuration with the provided default interval.
	pub fn new(default_interval: Duration) -> Self {
		Self { default_interval, max_retries: None }
	}

	/// Bounds the number of retries.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = Some(max_retries);

		self
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self::new(Duration::from_secs(1))
	}
}

/// Per-call retry state attached to a request after its first 429.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryContext {
	remaining_attempts: Option<u32>,
}
impl RetryContext {
	/// Creates a context with `max_retries` attempts left (`None` for unbounded).
	pub fn new(max_retries: Option<u32>) -> Self {
		Self { remaining_attempts: max_retries }
	}

	/// Remaining attempts, or `None` when unbounded.
	pub fn remaining_attempts(&self) -> Option<u32> {
		self.remaining_attempts
	}

	/// Consumes one attempt; returns `false` once the budget is spent.
	pub fn consume_attempt(&mut self) -> bool {
		match &mut self.remaining_attempts {
			None => true,
			Some(remaining) => {
				*remaining = remaining.saturating_sub(1);

				*remaining > 0
			},
		}
	}
}

/// Resends requests rejected with HTTP 429.
///
/// The wait happens on the calling task and races the request's
/// [`CancellationToken`], so a cancelled call aborts without resending.
pub struct RateLimitRetryInterceptor {
	authenticator: Arc<dyn Authenticator>,
	config: RateLimitConfig,
}
impl RateLimitRetryInterceptor {
	/// Creates an interceptor that re-authenticates each resend with `authenticator`.
	pub fn new(authenticator: Arc<dyn Authenticator>, config: RateLimitConfig) -> Self {
		Self { authenticator, config }
	}

	/// Active configuration.
	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	async fn retry_loop(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
		let cancellation = request.cancellation().cloned();

		loop {
			let response = next.run(request.clone()).await?;

			if response.status() != StatusCode::TOO_MANY_REQUESTS {
				return Ok(response);
			}

			let first_retry = request.retry_context().is_none();
			let resend = match request.retry_context_mut().map(RetryContext::consume_attempt) {
				None => self.config.max_retries != Some(0),
				Some(resend) => resend,
			};

			if !resend {
				stage_debug!("Retry budget exhausted; returning the throttled response.");
				obs::record_stage_outcome(Stage::RateLimitRetry, StageOutcome::Failure);

				return Ok(response);
			}

			let interval = backoff_interval(response.headers(), self.config.default_interval);

			drop(response);

			stage_debug!(
				interval_ms = interval.as_millis() as u64,
				remaining = ?request.retry_context().and_then(RetryContext::remaining_attempts),
				"Throttled; waiting before resending."
			);
			obs::record_stage_outcome(Stage::RateLimitRetry, StageOutcome::Attempt);

			wait(interval, cancellation.as_ref()).await?;

			if first_retry {
				request = request.with_retry_context(RetryContext::new(self.config.max_retries));
			}

			self.authenticator.authenticate(&mut request).await?;
		}
	}
}
impl Interceptor for RateLimitRetryInterceptor {
	fn name(&self) -> &'static str {
		"rate_limit_retry"
	}

	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> InterceptFuture<'a> {
		let span = StageSpan::new(Stage::RateLimitRetry, "intercept");

		Box::pin(span.instrument(self.retry_loop(request, next)))
	}
}
impl Debug for RateLimitRetryInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimitRetryInterceptor")
			.field("authenticator", &self.authenticator.authentication_type())
			.field("config", &self.config)
			.finish()
	}
}

/// Selects the wait before resending a throttled request.
///
/// `RateLimit-Reset` wins over `Retry-After`; both hold integer seconds. Missing,
/// malformed, or non-positive values fall back to `default_interval`.
pub fn backoff_interval(headers: &HeaderMap, default_interval: Duration) -> Duration {
	let Some(name) =
		[RATE_LIMIT_RESET, RETRY_AFTER].into_iter().find(|name| headers.contains_key(*name))
	else {
		return default_interval;
	};

	match header_str(headers, name).and_then(|raw| raw.parse::<i64>().ok()) {
		Some(secs) if secs > 0 => Duration::from_millis((secs as u64).saturating_mul(1_000)),
		_ => {
			stage_warn!(
				header = name,
				value = ?headers.get(name),
				"Ignoring unusable backoff header; using the default interval."
			);

			default_interval
		},
	}
}

async fn wait(interval: Duration, cancellation: Option<&CancellationToken>) -> Result<()> {
	let Some(token) = cancellation else {
		tokio::time::sleep(interval).await;

		return Ok(());
	};

	tokio::select! {
		biased;

		_ = token.cancelled() => Err(Error::Cancelled),
		_ = tokio::time::sleep(interval) => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderName, HeaderValue};
	// self
	use super::*;

	const DEFAULT: Duration = Duration::from_millis(250);

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		pairs
			.iter()
			.map(|&(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
			.collect()
	}

	#[test]
	fn rate_limit_reset_takes_precedence() {
		let map = headers(&[(RATE_LIMIT_RESET, "3"), (RETRY_AFTER, "9")]);

		assert_eq!(backoff_interval(&map, DEFAULT), Duration::from_secs(3));
		assert_eq!(
			backoff_interval(&headers(&[(RETRY_AFTER, "9")]), DEFAULT),
			Duration::from_secs(9)
		);
	}

	#[test]
	fn unusable_headers_fall_back_to_default() {
		for value in ["-1", "0", "soon", "1.5", ""] {
			assert_eq!(
				backoff_interval(&headers(&[(RETRY_AFTER, value)]), DEFAULT),
				DEFAULT,
				"`{value}` should fall back to the default interval."
			);
		}

		assert_eq!(backoff_interval(&HeaderMap::new(), DEFAULT), DEFAULT);
		assert_eq!(
			backoff_interval(&headers(&[(RATE_LIMIT_RESET, "x"), (RETRY_AFTER, "4")]), DEFAULT),
			DEFAULT
		);
	}

	#[test]
	fn retry_context_counts_down() {
		let mut bounded = RetryContext::new(Some(2));

		assert!(bounded.consume_attempt());
		assert_eq!(bounded.remaining_attempts(), Some(1));
		assert!(!bounded.consume_attempt());
		assert!(!bounded.consume_attempt());

		let mut none_left = RetryContext::new(Some(0));

		assert!(!none_left.consume_attempt());

		let mut unbounded = RetryContext::new(None);

		assert!((0..1_000).all(|_| unbounded.consume_attempt()));
	}

	#[tokio::test]
	async fn cancelled_wait_aborts() {
		let token = CancellationToken::new();

		token.cancel();

		let result = wait(Duration::from_secs(60), Some(&token)).await;

		assert!(matches!(result, Err(Error::Cancelled)));
		assert!(wait(Duration::from_millis(1), None).await.is_ok());
	}
}
