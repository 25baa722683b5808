//! Claim extraction for compact `<header>.<payload>.<signature>` tokens.
//!
//! Signatures are never verified: the decoder exists so authenticators can read `iat`/`exp`
//! and schedule refreshes, not to establish trust in the token.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Issued-at claim name.
pub const CLAIM_ISSUED_AT: &str = "iat";
/// Expiry claim name.
pub const CLAIM_EXPIRES_AT: &str = "exp";

/// Failures raised while decoding token claims.
#[derive(Debug, ThisError)]
pub enum TokenDecodeError {
	/// The token does not consist of exactly three dot-separated segments.
	#[error("Token must contain three dot-separated segments, found {found}.")]
	SegmentCount {
		/// Number of segments observed.
		found: usize,
	},
	/// A segment is not valid base64url.
	#[error("Token {segment} segment is not valid base64url.")]
	Base64 {
		/// Segment label (`header` or `payload`).
		segment: &'static str,
		/// Underlying decode failure.
		#[source]
		source: base64::DecodeError,
	},
	/// A segment does not hold a JSON object.
	#[error("Token {segment} segment is not a JSON object.")]
	Json {
		/// Segment label (`header` or `payload`).
		segment: &'static str,
		/// Underlying parse failure.
		#[source]
		source: serde_json::Error,
	},
	/// A numeric claim is present but neither an integer nor an integer string.
	#[error("Claim `{claim}` has an unexpected value type.")]
	UnexpectedClaimType {
		/// Claim name.
		claim: String,
	},
	/// `exp` precedes `iat`, or the derived refresh instant falls before the Unix epoch.
	#[error("Token lifetime is invalid: iat={issued_at}, exp={expires_at}.")]
	InvalidLifetime {
		/// `iat` claim in seconds.
		issued_at: i64,
		/// `exp` claim in seconds.
		expires_at: i64,
	},
	/// A claim required to derive the token expiry is absent.
	#[error("Token is missing the `{claim}` claim.")]
	MissingClaim {
		/// Claim name.
		claim: &'static str,
	},
}

/// Header and payload claims decoded from a compact token.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenClaims {
	header: BTreeMap<String, String>,
	payload: Map<String, Value>,
}
impl TokenClaims {
	/// Decodes the header and payload segments of `token`.
	pub fn decode(token: &str) -> Result<Self, TokenDecodeError> {
		let segments = token.trim().split('.').collect::<Vec<_>>();
		let [header, payload, _signature] = segments.as_slice() else {
			return Err(TokenDecodeError::SegmentCount { found: segments.len() });
		};
		let header = decode_segment("header", header)?
			.into_iter()
			.map(|(name, value)| {
				let value = coerce_string(&value);

				(name, value)
			})
			.collect();
		let payload = decode_segment("payload", payload)?;

		Ok(Self { header, payload })
	}

	/// Header claims with every value rendered as a string.
	pub fn header(&self) -> &BTreeMap<String, String> {
		&self.header
	}

	/// Raw payload claims.
	pub fn payload(&self) -> &Map<String, Value> {
		&self.payload
	}

	/// `iat` in seconds since the Unix epoch.
	pub fn issued_at(&self) -> Result<Option<i64>, TokenDecodeError> {
		self.numeric_claim(CLAIM_ISSUED_AT)
	}

	/// `exp` in seconds since the Unix epoch.
	pub fn expires_at(&self) -> Result<Option<i64>, TokenDecodeError> {
		self.numeric_claim(CLAIM_EXPIRES_AT)
	}

	/// `sub` claim.
	pub fn subject(&self) -> Option<String> {
		self.string_claim("sub")
	}

	/// `iss` claim.
	pub fn issuer(&self) -> Option<String> {
		self.string_claim("iss")
	}

	/// `aud` claim.
	pub fn audience(&self) -> Option<String> {
		self.string_claim("aud")
	}

	/// `uid` claim.
	pub fn user_id(&self) -> Option<String> {
		self.string_claim("uid")
	}

	/// `username` claim.
	pub fn username(&self) -> Option<String> {
		self.string_claim("username")
	}

	/// `role` claim.
	pub fn role(&self) -> Option<String> {
		self.string_claim("role")
	}

	/// Reads a numeric claim, accepting JSON integers and integer strings.
	pub fn numeric_claim(&self, name: &str) -> Result<Option<i64>, TokenDecodeError> {
		let unexpected = || TokenDecodeError::UnexpectedClaimType { claim: name.to_owned() };

		match self.payload.get(name) {
			None | Some(Value::Null) => Ok(None),
			Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(unexpected),
			Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| unexpected()),
			Some(_) => Err(unexpected()),
		}
	}

	/// Reads any claim and renders it as a string.
	pub fn string_claim(&self, name: &str) -> Option<String> {
		self.payload.get(name).filter(|value| !value.is_null()).map(coerce_string)
	}
}
impl FromStr for TokenClaims {
	type Err = TokenDecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::decode(s)
	}
}

fn decode_segment(segment: &'static str, raw: &str) -> Result<Map<String, Value>, TokenDecodeError> {
	let bytes = URL_SAFE_NO_PAD
		.decode(raw.trim_end_matches('='))
		.map_err(|source| TokenDecodeError::Base64 { segment, source })?;

	serde_json::from_slice(&bytes).map_err(|source| TokenDecodeError::Json { segment, source })
}

fn coerce_string(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn compact(header: &str, payload: &str) -> String {
		format!("{}.{}.signature", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn decodes_header_and_payload_claims() {
		let token = compact(
			r#"{"alg":"RS256","kid":7}"#,
			r#"{"iat":1000,"exp":"2000","sub":"svc","uid":42,"role":["admin"]}"#,
		);
		let claims = TokenClaims::decode(&token).expect("Fixture token should decode.");

		assert_eq!(claims.header().get("alg").map(String::as_str), Some("RS256"));
		assert_eq!(claims.header().get("kid").map(String::as_str), Some("7"));
		assert_eq!(claims.issued_at().expect("iat should be numeric."), Some(1000));
		assert_eq!(claims.expires_at().expect("exp string should normalize."), Some(2000));
		assert_eq!(claims.subject().as_deref(), Some("svc"));
		assert_eq!(claims.user_id().as_deref(), Some("42"));
		assert_eq!(claims.role().as_deref(), Some(r#"["admin"]"#));
		assert_eq!(claims.issuer(), None);
		assert_eq!(claims.username(), None);
	}

	#[test]
	fn numeric_claims_reject_unexpected_types() {
		let token = compact(r#"{"alg":"none"}"#, r#"{"iat":true,"exp":"soon","nbf":1.5}"#);
		let claims = TokenClaims::decode(&token).expect("Fixture token should decode.");

		assert!(matches!(
			claims.issued_at(),
			Err(TokenDecodeError::UnexpectedClaimType { claim }) if claim == "iat"
		));
		assert!(claims.expires_at().is_err());
		assert!(claims.numeric_claim("nbf").is_err());
		assert_eq!(claims.numeric_claim("missing").expect("Absent claims are not errors."), None);
	}

	#[test]
	fn padded_segments_are_accepted() {
		let header = base64::engine::general_purpose::URL_SAFE.encode(r#"{"a":"b"}"#);
		let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"iat":1}"#);
		let claims = TokenClaims::decode(&format!("{header}.{payload}.sig"))
			.expect("Padded segments should decode.");

		assert_eq!(claims.issued_at().expect("iat should be numeric."), Some(1));
	}

	#[test]
	fn malformed_tokens_fail() {
		assert!(matches!(
			TokenClaims::decode("only.two"),
			Err(TokenDecodeError::SegmentCount { found: 2 })
		));
		assert!(matches!(
			TokenClaims::decode("!!!.e30.sig"),
			Err(TokenDecodeError::Base64 { segment: "header", .. })
		));

		let not_object = compact(r#"{"alg":"none"}"#, "[1,2]");

		assert!(matches!(
			TokenClaims::decode(&not_object),
			Err(TokenDecodeError::Json { segment: "payload", .. })
		));
	}
}
