//! Request pipeline assembly: default headers, authentication, interceptors, transport.

// self
use crate::{
	_prelude::*,
	auth::Authenticator,
	http::{HeaderMap, HeaderValue, HttpTransport, Request, Response, header::IntoHeaderName},
	interceptor::{
		GzipRequestInterceptor, Interceptor, Next, RateLimitConfig, RateLimitRetryInterceptor,
	},
	obs::{self, Stage, StageOutcome, StageSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Authenticated, intercepted path from a [`Request`] to a [`Response`].
///
/// Interceptors run in the order `[gzip, rate-limit retry, custom...]`; disabled stages are
/// absent rather than no-ops. A pipeline is immutable once built and may be shared across
/// tasks behind an [`Arc`].
#[derive(Clone)]
pub struct Pipeline {
	transport: Arc<dyn HttpTransport>,
	authenticator: Arc<dyn Authenticator>,
	interceptors: Vec<Arc<dyn Interceptor>>,
	default_headers: HeaderMap,
}
impl Pipeline {
	/// Starts a builder around `transport` and `authenticator`.
	pub fn builder(
		transport: Arc<dyn HttpTransport>,
		authenticator: Arc<dyn Authenticator>,
	) -> PipelineBuilder {
		PipelineBuilder::new(transport, authenticator)
	}

	/// Starts a builder backed by a default [`ReqwestTransport`].
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(authenticator: Arc<dyn Authenticator>) -> PipelineBuilder {
		PipelineBuilder::new(Arc::new(ReqwestTransport::default()), authenticator)
	}

	/// Shared authenticator.
	pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
		&self.authenticator
	}

	/// Shared transport.
	pub fn transport(&self) -> &Arc<dyn HttpTransport> {
		&self.transport
	}

	/// Names of the active interceptors in execution order.
	pub fn interceptor_names(&self) -> Vec<&'static str> {
		self.interceptors.iter().map(|interceptor| interceptor.name()).collect()
	}

	/// Authenticates `request` and drives it through the chain.
	///
	/// Non-success statuses are returned as responses; a 429 that exhausted its retry
	/// budget comes back as the final throttled response.
	pub async fn send(&self, mut request: Request) -> Result<Response> {
		for (name, value) in &self.default_headers {
			if !request.headers().contains_key(name) {
				request.headers_mut().insert(name.clone(), value.clone());
			}
		}

		let span = StageSpan::new(Stage::Authenticate, "pipeline_send");

		obs::record_stage_outcome(Stage::Authenticate, StageOutcome::Attempt);

		let authenticated = span.instrument(self.authenticator.authenticate(&mut request)).await;

		obs::record_stage_result(Stage::Authenticate, &authenticated);

		authenticated?;

		Next::new(&self.interceptors, self.transport.as_ref()).run(request).await
	}

	/// Like [`Pipeline::send`], but maps non-success statuses to [`Error::Service`].
	pub async fn execute(&self, request: Request) -> Result<Response> {
		self.send(request).await?.error_for_status()
	}
}
impl Debug for Pipeline {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline")
			.field("authenticator", &self.authenticator.authentication_type())
			.field("interceptors", &self.interceptor_names())
			.field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
	transport: Arc<dyn HttpTransport>,
	authenticator: Arc<dyn Authenticator>,
	gzip: bool,
	rate_limit: Option<RateLimitConfig>,
	custom: Vec<Arc<dyn Interceptor>>,
	default_headers: HeaderMap,
}
impl PipelineBuilder {
	/// Creates a builder with compression and retries disabled.
	pub fn new(transport: Arc<dyn HttpTransport>, authenticator: Arc<dyn Authenticator>) -> Self {
		Self {
			transport,
			authenticator,
			gzip: false,
			rate_limit: None,
			custom: Vec::new(),
			default_headers: HeaderMap::new(),
		}
	}

	/// Enables or disables request-body gzip compression.
	pub fn gzip(mut self, enabled: bool) -> Self {
		self.gzip = enabled;

		self
	}

	/// Enables 429 retries with `config`.
	pub fn rate_limit_retry(mut self, config: RateLimitConfig) -> Self {
		self.rate_limit = Some(config);

		self
	}

	/// Disables 429 retries.
	pub fn without_rate_limit_retry(mut self) -> Self {
		self.rate_limit = None;

		self
	}

	/// Adds a header applied to requests that do not already carry it.
	pub fn default_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Appends a custom interceptor after the built-in ones.
	pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
		self.custom.push(interceptor);

		self
	}

	/// Assembles the pipeline.
	pub fn build(self) -> Pipeline {
		let Self { transport, authenticator, gzip, rate_limit, custom, default_headers } = self;
		let mut interceptors = Vec::<Arc<dyn Interceptor>>::with_capacity(custom.len() + 2);

		if gzip {
			interceptors.push(Arc::new(GzipRequestInterceptor));
		}
		if let Some(config) = rate_limit {
			interceptors
				.push(Arc::new(RateLimitRetryInterceptor::new(authenticator.clone(), config)));
		}

		interceptors.extend(custom);

		Pipeline { transport, authenticator, interceptors, default_headers }
	}
}
impl Debug for PipelineBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PipelineBuilder")
			.field("authenticator", &self.authenticator.authentication_type())
			.field("gzip", &self.gzip)
			.field("rate_limit", &self.rate_limit)
			.field("custom", &self.custom.iter().map(|i| i.name()).collect::<Vec<_>>())
			.finish()
	}
}
