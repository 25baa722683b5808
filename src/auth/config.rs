//! Authenticator configuration: a closed set of validated variants plus property parsing.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default IAM host used when no URL is configured.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";
/// Path appended to the IAM host to reach the token endpoint.
pub const IAM_TOKEN_PATH: &str = "/identity/token";

/// Property naming the authentication type.
pub const PROP_AUTH_TYPE: &str = "AUTH_TYPE";
/// Basic-auth username property.
pub const PROP_USERNAME: &str = "USERNAME";
/// Basic-auth password property.
pub const PROP_PASSWORD: &str = "PASSWORD";
/// Bearer token property.
pub const PROP_BEARER_TOKEN: &str = "BEARER_TOKEN";
/// IAM API key property.
pub const PROP_APIKEY: &str = "APIKEY";
/// IAM URL property.
pub const PROP_URL: &str = "URL";
/// IAM client id property.
pub const PROP_CLIENT_ID: &str = "CLIENT_ID";
/// IAM client secret property.
pub const PROP_CLIENT_SECRET: &str = "CLIENT_SECRET";
/// IAM scope property.
pub const PROP_SCOPE: &str = "SCOPE";

/// Authentication mechanisms understood by the factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
	/// HTTP basic authentication.
	Basic,
	/// Caller-managed bearer token.
	BearerToken,
	/// API key exchanged for short-lived IAM access tokens.
	Iam,
	/// No credentials.
	NoAuth,
}
impl AuthType {
	/// Returns the stable discriminator string.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthType::Basic => "basic",
			AuthType::BearerToken => "bearerToken",
			AuthType::Iam => "iam",
			AuthType::NoAuth => "noauth",
		}
	}
}
impl Display for AuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AuthType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let raw = s.trim();

		[AuthType::Basic, AuthType::BearerToken, AuthType::Iam, AuthType::NoAuth]
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
			.ok_or_else(|| ConfigError::UnsupportedAuthType { auth_type: raw.to_owned() })
	}
}

/// Credential string that redacts itself in `Debug`/`Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner credential. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Secret(<redacted>)")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Configuration for exactly one authenticator variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "auth_type", rename_all = "camelCase")]
pub enum AuthenticatorConfig {
	/// HTTP basic authentication.
	Basic(BasicConfig),
	/// Caller-managed bearer token.
	BearerToken(BearerTokenConfig),
	/// IAM API-key authentication.
	Iam(IamConfig),
	/// No credentials.
	#[serde(rename = "noauth")]
	NoAuth,
}
impl AuthenticatorConfig {
	/// Returns the variant discriminator.
	pub fn auth_type(&self) -> AuthType {
		match self {
			Self::Basic(_) => AuthType::Basic,
			Self::BearerToken(_) => AuthType::BearerToken,
			Self::Iam(_) => AuthType::Iam,
			Self::NoAuth => AuthType::NoAuth,
		}
	}

	/// Validates the selected variant.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self {
			Self::Basic(config) => config.validate(),
			Self::BearerToken(config) => config.validate(),
			Self::Iam(config) => config.validate(),
			Self::NoAuth => Ok(()),
		}
	}

	/// Builds a configuration from flat `AUTH_TYPE`/`USERNAME`/... properties.
	///
	/// `AUTH_TYPE` is matched case-insensitively and defaults to `iam` when absent.
	/// Empty values are treated as absent.
	pub fn from_properties<I, K, V>(properties: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let properties = properties
			.into_iter()
			.filter(|(_, value)| !value.as_ref().is_empty())
			.map(|(key, value)| (key.as_ref().to_owned(), value.as_ref().to_owned()))
			.collect::<HashMap<_, _>>();
		let get = |key: &str| properties.get(key).cloned();
		let auth_type = match get(PROP_AUTH_TYPE) {
			Some(raw) => raw.parse()?,
			None => AuthType::Iam,
		};
		let config = match auth_type {
			AuthType::Basic => {
				let mut builder = BasicConfig::builder();

				if let Some(username) = get(PROP_USERNAME) {
					builder = builder.username(username);
				}
				if let Some(password) = get(PROP_PASSWORD) {
					builder = builder.password(password);
				}

				Self::Basic(builder.build()?)
			},
			AuthType::BearerToken => Self::BearerToken(BearerTokenConfig::new(
				get(PROP_BEARER_TOKEN).unwrap_or_default(),
			)?),
			AuthType::Iam => {
				let mut builder = IamConfig::builder();

				if let Some(apikey) = get(PROP_APIKEY) {
					builder = builder.apikey(apikey);
				}
				if let Some(url) = get(PROP_URL) {
					builder = builder.url(url);
				}
				if let Some(client_id) = get(PROP_CLIENT_ID) {
					builder = builder.client_id(client_id);
				}
				if let Some(client_secret) = get(PROP_CLIENT_SECRET) {
					builder = builder.client_secret(client_secret);
				}
				if let Some(scope) = get(PROP_SCOPE) {
					builder = builder.scope(scope);
				}

				Self::Iam(builder.build()?)
			},
			AuthType::NoAuth => Self::NoAuth,
		};

		Ok(config)
	}
}
impl From<BasicConfig> for AuthenticatorConfig {
	fn from(config: BasicConfig) -> Self {
		Self::Basic(config)
	}
}
impl From<BearerTokenConfig> for AuthenticatorConfig {
	fn from(config: BearerTokenConfig) -> Self {
		Self::BearerToken(config)
	}
}
impl From<IamConfig> for AuthenticatorConfig {
	fn from(config: IamConfig) -> Self {
		Self::Iam(config)
	}
}

/// Username/password pair for HTTP basic authentication.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasicConfig {
	/// Account username.
	pub username: String,
	/// Account password.
	pub password: Secret,
}
impl BasicConfig {
	/// Returns a builder that validates on [`BasicConfigBuilder::build`].
	pub fn builder() -> BasicConfigBuilder {
		BasicConfigBuilder::default()
	}

	/// Validates the credential pair.
	pub fn validate(&self) -> Result<(), ConfigError> {
		require_credential(AuthType::Basic, "username", &self.username)?;
		require_credential(AuthType::Basic, "password", self.password.expose())
	}
}

/// Builder for [`BasicConfig`].
#[derive(Clone, Debug, Default)]
pub struct BasicConfigBuilder {
	username: Option<String>,
	password: Option<Secret>,
}
impl BasicConfigBuilder {
	/// Sets the username.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Sets the password.
	pub fn password(mut self, password: impl Into<Secret>) -> Self {
		self.password = Some(password.into());

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<BasicConfig, ConfigError> {
		let config = BasicConfig {
			username: self.username.unwrap_or_default(),
			password: self.password.unwrap_or_else(|| Secret::new("")),
		};

		config.validate()?;

		Ok(config)
	}
}

/// Caller-managed bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BearerTokenConfig {
	/// Token sent verbatim after `Bearer `.
	pub token: Secret,
}
impl BearerTokenConfig {
	/// Creates and validates a bearer token config.
	pub fn new(token: impl Into<Secret>) -> Result<Self, ConfigError> {
		let config = Self { token: token.into() };

		config.validate()?;

		Ok(config)
	}

	/// Ensures the token is present.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.token.expose().is_empty() {
			return Err(ConfigError::MissingProperty {
				auth_type: AuthType::BearerToken.as_str(),
				property: "token",
			});
		}

		Ok(())
	}
}

/// API-key credentials exchanged for IAM access tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IamConfig {
	/// API key sent to the token endpoint.
	pub apikey: Secret,
	/// IAM host, optionally already including the token path.
	pub url: Url,
	/// Optional client id used to authenticate against the token endpoint.
	pub client_id: Option<String>,
	/// Optional client secret paired with `client_id`.
	pub client_secret: Option<Secret>,
	/// Optional space-delimited scope requested with the token.
	pub scope: Option<String>,
}
impl IamConfig {
	/// Returns a builder that validates on [`IamConfigBuilder::build`].
	pub fn builder() -> IamConfigBuilder {
		IamConfigBuilder::default()
	}

	/// Validates the API key and the client credential pairing.
	pub fn validate(&self) -> Result<(), ConfigError> {
		require_credential(AuthType::Iam, "apikey", self.apikey.expose())?;

		match (&self.client_id, &self.client_secret) {
			(Some(id), Some(secret)) if !id.is_empty() && !secret.expose().is_empty() => Ok(()),
			(None, None) => Ok(()),
			_ => Err(ConfigError::IncompleteClientCredentials),
		}
	}

	/// Resolves the token endpoint, appending the IAM token path when missing.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		let base = self.url.as_str().trim_end_matches('/');
		let raw = if base.ends_with(IAM_TOKEN_PATH) {
			base.to_owned()
		} else {
			format!("{base}{IAM_TOKEN_PATH}")
		};

		parse_url(&raw)
	}
}

/// Builder for [`IamConfig`].
#[derive(Clone, Debug, Default)]
pub struct IamConfigBuilder {
	apikey: Option<Secret>,
	url: Option<String>,
	client_id: Option<String>,
	client_secret: Option<Secret>,
	scope: Option<String>,
}
impl IamConfigBuilder {
	/// Sets the API key.
	pub fn apikey(mut self, apikey: impl Into<Secret>) -> Self {
		self.apikey = Some(apikey.into());

		self
	}

	/// Overrides the IAM URL (defaults to [`DEFAULT_IAM_URL`]).
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());

		self
	}

	/// Sets the client id used against the token endpoint.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret used against the token endpoint.
	pub fn client_secret(mut self, client_secret: impl Into<Secret>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the requested scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<IamConfig, ConfigError> {
		let url = parse_url(self.url.as_deref().unwrap_or(DEFAULT_IAM_URL))?;
		let config = IamConfig {
			apikey: self.apikey.unwrap_or_else(|| Secret::new("")),
			url,
			client_id: self.client_id,
			client_secret: self.client_secret,
			scope: self.scope,
		};

		config.validate()?;

		Ok(config)
	}
}

/// Returns `true` when `value` starts or ends with `{`, `}` or `"`.
pub fn has_bad_start_or_end_char(value: &str) -> bool {
	const BAD: [char; 3] = ['{', '}', '"'];

	value.starts_with(BAD) || value.ends_with(BAD)
}

fn require_credential(
	auth_type: AuthType,
	property: &'static str,
	value: &str,
) -> Result<(), ConfigError> {
	if value.is_empty() {
		return Err(ConfigError::MissingProperty { auth_type: auth_type.as_str(), property });
	}
	if has_bad_start_or_end_char(value) {
		return Err(ConfigError::BadCredentialFormat { property });
	}

	Ok(())
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { url: raw.to_owned(), source })
}
