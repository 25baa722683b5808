//! Access tokens with a proactive, clock-based expiry.

// self
use crate::{
	_prelude::*,
	auth::token::claims::{CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT, TokenClaims, TokenDecodeError},
};

/// Expiry sentinel for tokens that never expire.
pub const NEVER_EXPIRES: i64 = -1;

// Fraction of the issued lifetime after which the token is treated as stale.
const REFRESH_WINDOW_RATIO: f64 = 0.8;

/// Raw token string paired with the instant (Unix milliseconds) after which it must be
/// refreshed.
///
/// Tokens are replaced, never mutated, when refreshed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	token: String,
	expires_at_millis: i64,
}
impl AccessToken {
	/// Wraps a caller-managed token that never expires.
	pub fn from_user_supplied(token: impl Into<String>) -> Self {
		Self { token: token.into(), expires_at_millis: NEVER_EXPIRES }
	}

	/// Wraps a token returned by an issuance endpoint.
	///
	/// Both `iat` and `exp` must be present; the expiry is placed at 80% of the issued
	/// lifetime so callers refresh before the server-side deadline. The fractional
	/// millisecond is truncated. Lifetimes where `exp` precedes `iat`, or whose refresh
	/// instant lands before the epoch, are rejected.
	pub fn from_issuance_response(
		token: impl Into<String>,
		claims: &TokenClaims,
	) -> Result<Self, TokenDecodeError> {
		let issued_at =
			claims.issued_at()?.ok_or(TokenDecodeError::MissingClaim { claim: CLAIM_ISSUED_AT })?;
		let expires_at = claims
			.expires_at()?
			.ok_or(TokenDecodeError::MissingClaim { claim: CLAIM_EXPIRES_AT })?;
		let invalid = TokenDecodeError::InvalidLifetime { issued_at, expires_at };

		if expires_at < issued_at {
			return Err(invalid);
		}

		let lifetime = expires_at.saturating_sub(issued_at) as f64;
		let refresh_at = issued_at as f64 + REFRESH_WINDOW_RATIO * lifetime;
		let expires_at_millis = (refresh_at * 1000.0) as i64;

		// Negative values are reserved for `NEVER_EXPIRES`.
		if expires_at_millis < 0 {
			return Err(invalid);
		}

		Ok(Self { token: token.into(), expires_at_millis })
	}

	/// Decodes `token`'s claims and derives its expiry in one step.
	pub fn decode(token: impl Into<String>) -> Result<Self, TokenDecodeError> {
		let token = token.into();
		let claims = TokenClaims::decode(&token)?;

		Self::from_issuance_response(token, &claims)
	}

	/// Returns the raw token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.token
	}

	/// Refresh deadline in Unix milliseconds, or [`NEVER_EXPIRES`].
	pub fn expires_at_millis(&self) -> i64 {
		self.expires_at_millis
	}

	/// Returns `true` when the token carries the never-expires sentinel.
	pub fn never_expires(&self) -> bool {
		self.expires_at_millis < 0
	}

	/// Checks validity against the provided instant.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		if self.token.is_empty() {
			return false;
		}

		self.never_expires() || unix_millis(now) <= self.expires_at_millis
	}

	/// Checks validity against the current UTC clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("expires_at_millis", &self.expires_at_millis)
			.finish()
	}
}

fn unix_millis(instant: OffsetDateTime) -> i64 {
	(instant.unix_timestamp_nanos() / 1_000_000) as i64
}
