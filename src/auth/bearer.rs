//! Caller-managed bearer tokens.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthFuture, AuthType, Authenticator, BearerTokenConfig, authenticator},
	error::ConfigError,
	http::Request,
};

/// Sends `Authorization: Bearer <token>` using a token the caller owns and rotates.
#[derive(Debug)]
pub struct BearerTokenAuthenticator {
	token: RwLock<AccessToken>,
}
impl BearerTokenAuthenticator {
	/// Validates `config` and caches its token.
	pub fn new(config: BearerTokenConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { token: RwLock::new(AccessToken::from_user_supplied(config.token.expose())) })
	}

	/// Replaces the token used by subsequent requests.
	pub fn set_bearer_token(&self, token: impl Into<String>) -> Result<(), ConfigError> {
		let config = BearerTokenConfig::new(token.into())?;

		*self.token.write() = AccessToken::from_user_supplied(config.token.expose());

		Ok(())
	}
}
impl Authenticator for BearerTokenAuthenticator {
	fn authentication_type(&self) -> AuthType {
		AuthType::BearerToken
	}

	fn authenticate<'a>(&'a self, request: &'a mut Request) -> AuthFuture<'a> {
		let result = authenticator::bearer_value(&self.token.read())
			.map(|value| authenticator::set_authorization(request, value))
			.map_err(Error::from);

		Box::pin(async move { result })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::header::AUTHORIZATION;
	// self
	use super::*;

	#[tokio::test]
	async fn rotated_tokens_apply_to_later_requests() {
		let authenticator = BearerTokenAuthenticator::new(
			BearerTokenConfig::new("first").expect("Bearer config should build."),
		)
		.expect("Authenticator should build.");
		let url = Url::parse("https://example.com").expect("Fixture URL should parse.");
		let mut request = Request::get(url.clone());

		authenticator.authenticate(&mut request).await.expect("Bearer auth should succeed.");

		assert_eq!(request.headers().get(AUTHORIZATION).expect("Header must be set."), "Bearer first");

		authenticator.set_bearer_token("second").expect("Rotation should succeed.");

		let mut request = Request::get(url);

		authenticator.authenticate(&mut request).await.expect("Bearer auth should succeed.");

		assert_eq!(
			request.headers().get(AUTHORIZATION).expect("Header must be set."),
			"Bearer second"
		);
		assert!(authenticator.set_bearer_token("").is_err());
	}
}
