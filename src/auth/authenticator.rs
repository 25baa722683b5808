//! Authenticator contract and the config-driven factory.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthType, AuthenticatorConfig, BasicAuthenticator, BearerTokenAuthenticator,
		IamAuthenticator, NoAuthAuthenticator,
	},
	error::ConfigError,
	http::{HeaderValue, HttpTransport, Request},
};

/// Boxed future returned by [`Authenticator::authenticate`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Adds credentials to outgoing requests.
///
/// One instance is shared by every in-flight call that uses it, so implementations that
/// cache tokens must guard refreshes against concurrent callers.
pub trait Authenticator
where
	Self: Send + Sync,
{
	/// Stable discriminator for this authenticator.
	fn authentication_type(&self) -> AuthType;

	/// Adds or overwrites the headers required to authenticate `request`.
	///
	/// May refresh a cached token first.
	fn authenticate<'a>(&'a self, request: &'a mut Request) -> AuthFuture<'a>;
}

/// Validates `config` and builds the matching authenticator.
///
/// `transport` is used by variants that fetch tokens from an issuance endpoint.
pub fn build_authenticator(
	config: AuthenticatorConfig,
	transport: Arc<dyn HttpTransport>,
) -> Result<Arc<dyn Authenticator>> {
	config.validate()?;

	let authenticator: Arc<dyn Authenticator> = match config {
		AuthenticatorConfig::Basic(config) => Arc::new(BasicAuthenticator::new(config)?),
		AuthenticatorConfig::BearerToken(config) =>
			Arc::new(BearerTokenAuthenticator::new(config)?),
		AuthenticatorConfig::Iam(config) => Arc::new(IamAuthenticator::new(config, transport)?),
		AuthenticatorConfig::NoAuth => Arc::new(NoAuthAuthenticator),
	};

	Ok(authenticator)
}

/// Builds an authenticator from flat properties; see
/// [`AuthenticatorConfig::from_properties`].
pub fn build_authenticator_from_properties<I, K, V>(
	properties: I,
	transport: Arc<dyn HttpTransport>,
) -> Result<Arc<dyn Authenticator>>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	build_authenticator(AuthenticatorConfig::from_properties(properties)?, transport)
}

pub(crate) fn set_authorization(request: &mut Request, mut value: HeaderValue) {
	value.set_sensitive(true);
	request.headers_mut().insert(AUTHORIZATION, value);
}

pub(crate) fn bearer_value(token: &AccessToken) -> Result<HeaderValue, ConfigError> {
	Ok(HeaderValue::from_str(&format!("Bearer {}", token.expose()))?)
}

pub(crate) fn basic_value(username: &str, password: &str) -> Result<HeaderValue, ConfigError> {
	let encoded = STANDARD.encode(format!("{username}:{password}"));

	Ok(HeaderValue::from_str(&format!("Basic {encoded}"))?)
}
