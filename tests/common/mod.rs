//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use sdk_pipeline::{
	auth::{AuthFuture, AuthType, Authenticator},
	http::{HeaderValue, HttpTransport, Request, Response, StatusCode, TransportFuture, header},
	url::Url,
};

/// Transport that replays queued responses and records every request it receives.
///
/// Once the queue drains, the last response is repeated.
#[derive(Default)]
pub struct ScriptedTransport {
	responses: Mutex<VecDeque<Response>>,
	last: Mutex<Option<Response>>,
	requests: Mutex<Vec<Request>>,
}
impl ScriptedTransport {
	pub fn new(responses: impl IntoIterator<Item = Response>) -> Arc<Self> {
		Arc::new(Self { responses: Mutex::new(responses.into_iter().collect()), ..Default::default() })
	}

	pub fn requests(&self) -> Vec<Request> {
		self.requests.lock().clone()
	}

	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: Request) -> TransportFuture<'_> {
		self.requests.lock().push(request);

		let next = self.responses.lock().pop_front();
		let response = match next {
			Some(response) => {
				*self.last.lock() = Some(response.clone());

				response
			},
			None => self.last.lock().clone().unwrap_or_else(|| Response::new(StatusCode::OK)),
		};

		Box::pin(async move { Ok(response) })
	}
}

/// Authenticator that stamps `Authorization: Bearer call-<n>` and counts its calls.
#[derive(Debug, Default)]
pub struct CountingAuthenticator {
	calls: AtomicUsize,
}
impl CountingAuthenticator {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl Authenticator for CountingAuthenticator {
	fn authentication_type(&self) -> AuthType {
		AuthType::BearerToken
	}

	fn authenticate<'a>(&'a self, request: &'a mut Request) -> AuthFuture<'a> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		let value = HeaderValue::from_str(&format!("Bearer call-{call}"))
			.expect("Counting header should be valid.");

		request.headers_mut().insert(header::AUTHORIZATION, value);

		Box::pin(async { Ok(()) })
	}
}

pub fn url(path: &str) -> Url {
	Url::parse("https://api.example.com")
		.and_then(|base| base.join(path))
		.expect("Fixture URL should parse.")
}

pub fn throttled() -> Response {
	Response::new(StatusCode::TOO_MANY_REQUESTS)
}

pub fn ok(body: &'static str) -> Response {
	Response::new(StatusCode::OK).with_body(body)
}

/// Builds an unsigned compact token carrying the provided `iat`/`exp` claims.
pub fn unsigned_token(iat: Option<i64>, exp: Option<i64>) -> String {
	let mut payload = serde_json::Map::new();

	payload.insert("sub".into(), "integration".into());

	if let Some(iat) = iat {
		payload.insert("iat".into(), iat.into());
	}
	if let Some(exp) = exp {
		payload.insert("exp".into(), exp.into());
	}

	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD
		.encode(serde_json::to_vec(&payload).expect("Claims should serialize."));

	format!("{header}.{payload}.signature")
}

/// Current Unix time in seconds.
pub fn now_secs() -> i64 {
	time::OffsetDateTime::now_utc().unix_timestamp()
}

/// IAM-style token response body for `token`.
pub fn token_body(token: &str) -> String {
	serde_json::json!({
		"access_token": token,
		"refresh_token": "not-used",
		"token_type": "Bearer",
		"expires_in": 3600,
		"expiration": now_secs() + 3600,
	})
	.to_string()
}

/// Builds a reqwest transport that trusts the mock server's self-signed certificate.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_transport() -> sdk_pipeline::http::ReqwestTransport {
	let client = sdk_pipeline::reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure reqwest client for tests.");

	sdk_pipeline::http::ReqwestTransport::with_client(client)
}
