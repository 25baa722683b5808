//! HTTP request/response values and the transport seam.
//!
//! [`Request`] carries the per-call state the interceptor chain needs alongside the usual
//! method/URL/headers/body: the [`RetryContext`] attached by the rate-limit interceptor
//! and an optional [`CancellationToken`] that interrupts backoff waits.
//! [`HttpTransport`] is the only dependency on an HTTP stack; [`ReqwestTransport`] is the
//! default implementation.

pub mod body;

pub use body::*;

// crates.io
#[cfg(feature = "reqwest")] use futures_util::stream;
use oauth2::http::header::{AsHeaderName, IntoHeaderName, RETRY_AFTER};
pub use oauth2::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ServiceError, TransportError},
	interceptor::RetryContext,
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to send a [`Request`].
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// the pipeline and by authenticators that call token endpoints.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the response.
	fn send(&self, request: Request) -> TransportFuture<'_>;
}

/// Outgoing request plus the per-call state carried through the interceptor chain.
#[derive(Clone, Debug)]
pub struct Request {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Body,
	retry: Option<RetryContext>,
	cancellation: Option<CancellationToken>,
}
impl Request {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self {
			method,
			url,
			headers: HeaderMap::new(),
			body: Body::Empty,
			retry: None,
			cancellation: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Sets (replacing) a header.
	pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Body>) -> Self {
		self.body = body.into();

		self
	}

	/// Attaches per-call retry state.
	pub fn with_retry_context(mut self, context: RetryContext) -> Self {
		self.retry = Some(context);

		self
	}

	/// Attaches a token that interrupts backoff waits when cancelled.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = Some(token);

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Request headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Mutable request headers; authenticators write `Authorization` here.
	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		&mut self.headers
	}

	/// Request body.
	pub fn body(&self) -> &Body {
		&self.body
	}

	/// Retry state, present once the call has been throttled at least once.
	pub fn retry_context(&self) -> Option<&RetryContext> {
		self.retry.as_ref()
	}

	/// Mutable retry state.
	pub fn retry_context_mut(&mut self) -> Option<&mut RetryContext> {
		self.retry.as_mut()
	}

	/// Cancellation token, if one was attached.
	pub fn cancellation(&self) -> Option<&CancellationToken> {
		self.cancellation.as_ref()
	}
}

/// Buffered HTTP response.
#[derive(Clone, Debug)]
pub struct Response {
	status: StatusCode,
	headers: HeaderMap,
	body: Bytes,
}
impl Response {
	/// Creates a response with the provided status and no headers or body.
	pub fn new(status: StatusCode) -> Self {
		Self { status, headers: HeaderMap::new(), body: Bytes::new() }
	}

	/// Sets (replacing) a header.
	pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();

		self
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Response body.
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	/// Converts non-success statuses into [`ServiceError`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.status.is_success() {
			return Ok(self);
		}

		Err(ServiceError {
			status: self.status.as_u16(),
			reason: self.status.canonical_reason().unwrap_or("Unknown Status").to_owned(),
			body: self.body,
		}
		.into())
	}
}

/// Thin wrapper around [`reqwest::Client`] so shared HTTP behavior lives in one place.
///
/// Gzip bodies are streamed with chunked transfer encoding; every response is buffered
/// before it is handed back to the chain.
///
/// Compression runs inline while reqwest polls the body stream, on whichever task drives
/// the call. That is fine for SDK-sized payloads; multi-megabyte uploads will hold the
/// executor thread for the duration of the encode.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub reqwest::Client);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`reqwest::Client`].
	pub fn with_client(client: reqwest::Client) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<reqwest::Client> for ReqwestTransport {
	fn as_ref(&self) -> &reqwest::Client {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: Request) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let Request { method, url, headers, body, .. } = request;
			let builder = client.request(method, url).headers(headers);
			let builder = match body {
				Body::Empty => builder,
				Body::Bytes(bytes) => builder.body(bytes),
				Body::Gzip(gzip) =>
					builder.body(reqwest::Body::wrap_stream(stream::iter(gzip.chunks()))),
			};
			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?;

			Ok(Response { status, headers, body })
		})
	}
}

/// Reads a header as trimmed UTF-8.
pub fn header_str<K>(headers: &HeaderMap, name: K) -> Option<&str>
where
	K: AsHeaderName,
{
	headers.get(name)?.to_str().ok().map(str::trim)
}

/// Parses `Retry-After` as either delta-seconds or an RFC 2822 date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = header_str(headers, RETRY_AFTER)?;

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Duration::try_from(delta).ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let headers = HeaderMap::from_iter([(RETRY_AFTER, HeaderValue::from_static("7"))]);

		assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

		let past = HeaderMap::from_iter([(
			RETRY_AFTER,
			HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 +0000"),
		)]);

		assert_eq!(parse_retry_after(&past), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn error_for_status_maps_throttling() {
		let err = Response::new(StatusCode::TOO_MANY_REQUESTS)
			.with_body("slow down")
			.error_for_status()
			.expect_err("429 must map to an error.");

		assert_eq!(err.status(), Some(429));

		match err {
			Error::Service(e) => {
				assert!(e.is_too_many_requests());
				assert_eq!(e.reason, "Too Many Requests");
				assert_eq!(e.body, Bytes::from_static(b"slow down"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}

		assert!(Response::new(StatusCode::OK).error_for_status().is_ok());
	}

	#[test]
	fn request_builders_keep_state() {
		let url = Url::parse("https://example.com/v1").expect("Fixture URL should parse.");
		let token = CancellationToken::new();
		let request = Request::post(url)
			.with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.with_body("{}")
			.with_cancellation(token);

		assert_eq!(request.method(), &Method::POST);
		assert_eq!(request.body().content_length(), Some(2));
		assert!(request.retry_context().is_none());
		assert!(request.cancellation().is_some());
	}
}
