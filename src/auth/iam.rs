//! IAM API-key authentication with cached, proactively refreshed access tokens.
//!
//! The authenticator exchanges its API key for an access token at the configured token
//! endpoint, derives a refresh deadline from the token's `iat`/`exp` claims, and reuses the
//! token until that deadline passes. Concurrent callers holding a stale token funnel
//! through a singleflight guard so only one exchange is in flight at a time.

// crates.io
use oauth2::{
	TokenResponse,
	basic::BasicTokenResponse,
	http::header::{ACCEPT, CONTENT_TYPE},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthFuture, AuthType, Authenticator, IamConfig, authenticator},
	error::{ConfigError, TransientError},
	http::{self, HeaderValue, HttpTransport, Request},
	obs::{self, Stage, StageOutcome, StageSpan},
};

const GRANT_TYPE_APIKEY: &str = "urn:ibm:params:oauth:grant-type:apikey";
const RESPONSE_TYPE: &str = "cloud_iam";
const BODY_PREVIEW_LIMIT: usize = 256;

/// Exchanges an API key for bearer tokens and caches them until their refresh deadline.
pub struct IamAuthenticator {
	config: IamConfig,
	token_endpoint: Url,
	client_authorization: Option<HeaderValue>,
	transport: Arc<dyn HttpTransport>,
	cached: RwLock<Option<AccessToken>>,
	refresh_guard: AsyncMutex<()>,
}
impl IamAuthenticator {
	/// Validates `config` and binds the transport used for token requests.
	pub fn new(config: IamConfig, transport: Arc<dyn HttpTransport>) -> Result<Self, ConfigError> {
		config.validate()?;

		let token_endpoint = config.token_endpoint()?;
		let client_authorization = match (&config.client_id, &config.client_secret) {
			(Some(id), Some(secret)) => Some(authenticator::basic_value(id, secret.expose())?),
			_ => None,
		};

		Ok(Self {
			config,
			token_endpoint,
			client_authorization,
			transport,
			cached: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		})
	}

	/// Resolved token endpoint.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Returns a valid access token, requesting a new one when the cache is stale.
	pub async fn token(&self) -> Result<AccessToken> {
		if let Some(token) = self.cached_valid() {
			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// Another caller may have refreshed while this one waited.
		if let Some(token) = self.cached_valid() {
			return Ok(token);
		}

		let span = StageSpan::new(Stage::TokenRequest, "iam_token");

		obs::record_stage_outcome(Stage::TokenRequest, StageOutcome::Attempt);

		let result = span.instrument(self.request_token()).await;

		obs::record_stage_result(Stage::TokenRequest, &result);

		let token = result?;

		*self.cached.write() = Some(token.clone());

		Ok(token)
	}

	/// Drops the cached token so the next request performs a fresh exchange.
	pub fn invalidate(&self) {
		*self.cached.write() = None;
	}

	fn cached_valid(&self) -> Option<AccessToken> {
		self.cached.read().as_ref().filter(|token| token.is_valid()).cloned()
	}

	async fn request_token(&self) -> Result<AccessToken> {
		// `Serializer` is `!Send`; drop it before awaiting.
		let form = {
			let mut form = Serializer::new(String::new());

			form.append_pair("grant_type", GRANT_TYPE_APIKEY)
				.append_pair("apikey", self.config.apikey.expose())
				.append_pair("response_type", RESPONSE_TYPE);

			if let Some(scope) = &self.config.scope {
				form.append_pair("scope", scope);
			}

			form.finish()
		};
		let mut request = Request::post(self.token_endpoint.clone())
			.with_header(
				CONTENT_TYPE,
				HeaderValue::from_static("application/x-www-form-urlencoded"),
			)
			.with_header(ACCEPT, HeaderValue::from_static("application/json"))
			.with_body(form);

		if let Some(value) = &self.client_authorization {
			authenticator::set_authorization(&mut request, value.clone());
		}

		let response = self.transport.send(request).await?;
		let status = response.status();

		if !status.is_success() {
			let preview = String::from_utf8_lossy(response.body());

			return Err(TransientError::TokenEndpoint {
				message: preview.chars().take(BODY_PREVIEW_LIMIT).collect(),
				status: Some(status.as_u16()),
				retry_after: http::parse_retry_after(response.headers()),
			}
			.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let parsed: BasicTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TransientError::TokenResponseParse {
				source,
				status: Some(status.as_u16()),
			})?;

		Ok(AccessToken::decode(parsed.access_token().secret().as_str())?)
	}
}
impl Authenticator for IamAuthenticator {
	fn authentication_type(&self) -> AuthType {
		AuthType::Iam
	}

	fn authenticate<'a>(&'a self, request: &'a mut Request) -> AuthFuture<'a> {
		Box::pin(async move {
			let token = self.token().await?;

			authenticator::set_authorization(request, authenticator::bearer_value(&token)?);

			Ok::<_, Error>(())
		})
	}
}
impl Debug for IamAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IamAuthenticator")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.config.client_id)
			.field("scope", &self.config.scope)
			.field("cached", &self.cached.read().is_some())
			.finish()
	}
}
