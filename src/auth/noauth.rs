//! Authenticator for services that need no credentials.

// self
use crate::{
	_prelude::*,
	auth::{AuthFuture, AuthType, Authenticator},
	http::Request,
};

/// Leaves requests untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuthAuthenticator;
impl Authenticator for NoAuthAuthenticator {
	fn authentication_type(&self) -> AuthType {
		AuthType::NoAuth
	}

	fn authenticate<'a>(&'a self, _request: &'a mut Request) -> AuthFuture<'a> {
		Box::pin(async { Ok::<_, Error>(()) })
	}
}
