//! Request-body gzip compression.

// crates.io
use oauth2::http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
// self
use crate::{
	_prelude::*,
	http::{Body, GzipBody, HeaderValue, Request},
	interceptor::{InterceptFuture, Interceptor, Next},
};

/// Compresses non-empty request bodies that do not already declare an encoding.
///
/// Stateless and idempotent: a request it has already rewritten carries
/// `Content-Encoding: gzip` and passes through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct GzipRequestInterceptor;
impl GzipRequestInterceptor {
	/// Applies the compression decision to a single request.
	pub fn compress(&self, request: Request) -> Request {
		if request.headers().contains_key(CONTENT_ENCODING) {
			return request;
		}

		let source = match request.body() {
			Body::Bytes(bytes) if !bytes.is_empty() => bytes.clone(),
			_ => return request,
		};
		let mut request = request
			.with_header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
			.with_body(Body::Gzip(GzipBody::new(source)));

		request.headers_mut().remove(CONTENT_LENGTH);

		request
	}
}
impl Interceptor for GzipRequestInterceptor {
	fn name(&self) -> &'static str {
		"gzip"
	}

	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> InterceptFuture<'a> {
		next.run(self.compress(request))
	}
}
