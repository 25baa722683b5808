//! HTTP basic authentication.

// self
use crate::{
	_prelude::*,
	auth::{AuthFuture, AuthType, Authenticator, BasicConfig, authenticator},
	error::ConfigError,
	http::{HeaderValue, Request},
};

/// Sends a precomputed `Authorization: Basic ...` header with every request.
#[derive(Clone)]
pub struct BasicAuthenticator {
	authorization: HeaderValue,
}
impl BasicAuthenticator {
	/// Validates `config` and encodes the credentials once.
	pub fn new(config: BasicConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		let authorization =
			authenticator::basic_value(&config.username, config.password.expose())?;

		Ok(Self { authorization })
	}
}
impl Authenticator for BasicAuthenticator {
	fn authentication_type(&self) -> AuthType {
		AuthType::Basic
	}

	fn authenticate<'a>(&'a self, request: &'a mut Request) -> AuthFuture<'a> {
		authenticator::set_authorization(request, self.authorization.clone());

		Box::pin(async { Ok::<_, Error>(()) })
	}
}
impl Debug for BasicAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BasicAuthenticator(..)")
	}
}
