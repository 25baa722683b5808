mod common;

// std
use std::sync::Arc;
// crates.io
use sdk_pipeline::{
	auth::{
		AuthType, Authenticator, AuthenticatorConfig, BasicConfig, BearerTokenConfig, IamConfig,
		Secret, build_authenticator, build_authenticator_from_properties,
	},
	error::{ConfigError, Error},
	http::{Request, header},
	pipeline::Pipeline,
};
// self
use common::{ScriptedTransport, ok, url};

fn rejection(result: Result<Arc<dyn Authenticator>, Error>, reason: &str) -> Error {
	match result {
		Ok(authenticator) =>
			panic!("{reason} Built {:?} instead.", authenticator.authentication_type()),
		Err(err) => err,
	}
}

#[test]
fn properties_dispatch_to_every_variant() {
	let transport = Arc::new(ScriptedTransport::default());
	let cases = [
		(vec![("AUTH_TYPE", "basic"), ("USERNAME", "user"), ("PASSWORD", "pass")], AuthType::Basic),
		(vec![("AUTH_TYPE", "BEARERTOKEN"), ("BEARER_TOKEN", "abc")], AuthType::BearerToken),
		(vec![("AUTH_TYPE", "iam"), ("APIKEY", "key")], AuthType::Iam),
		(vec![("APIKEY", "key"), ("URL", "https://iam.example.com")], AuthType::Iam),
		(vec![("AUTH_TYPE", "noAuth")], AuthType::NoAuth),
	];

	for (properties, expected) in cases {
		let authenticator = build_authenticator_from_properties(properties, transport.clone())
			.expect("Properties should build an authenticator.");

		assert_eq!(authenticator.authentication_type(), expected);
	}
}

#[test]
fn unsupported_types_name_the_offender() {
	let err = rejection(
		build_authenticator_from_properties(
			[("AUTH_TYPE", "kerberos")],
			Arc::new(ScriptedTransport::default()),
		),
		"Unknown types must be rejected.",
	);

	assert!(matches!(
		&err,
		Error::Config(ConfigError::UnsupportedAuthType { auth_type }) if auth_type == "kerberos"
	));
	assert!(err.to_string().contains("kerberos"));
}

#[test]
fn directly_built_configs_are_validated() {
	let transport = Arc::new(ScriptedTransport::default());
	let basic = BasicConfig { username: "\"user\"".into(), password: Secret::new("pass") };
	let err = rejection(
		build_authenticator(basic.into(), transport.clone()),
		"Quoted usernames must be rejected.",
	);

	assert!(matches!(
		err,
		Error::Config(ConfigError::BadCredentialFormat { property: "username" })
	));

	let bearer = BearerTokenConfig { token: Secret::new("") };
	let err =
		rejection(build_authenticator(bearer.into(), transport.clone()), "Empty tokens fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingProperty { .. })));

	let mut iam = IamConfig::builder().apikey("key").build().expect("IAM config should build.");

	iam.client_secret = Some(Secret::new("orphan"));

	let err = rejection(build_authenticator(iam.into(), transport), "Orphan secrets fail.");

	assert!(matches!(err, Error::Config(ConfigError::IncompleteClientCredentials)));
}

#[test]
fn configs_deserialize_from_tagged_documents() {
	let config: AuthenticatorConfig = serde_json::from_str(
		r#"{"auth_type":"iam","apikey":"key","url":"https://iam.example.com/","client_id":null,"client_secret":null,"scope":null}"#,
	)
	.expect("IAM document should deserialize.");

	assert_eq!(config.auth_type(), AuthType::Iam);

	let config: AuthenticatorConfig =
		serde_json::from_str(r#"{"auth_type":"noauth"}"#).expect("noauth should deserialize.");

	assert_eq!(config.auth_type(), AuthType::NoAuth);
}

#[tokio::test]
async fn factory_output_drives_a_pipeline() {
	let transport = ScriptedTransport::new([ok("hello")]);
	let authenticator = build_authenticator(
		BearerTokenConfig::new("opaque-token").expect("Bearer config should build.").into(),
		transport.clone(),
	)
	.expect("Bearer authenticator should build.");
	let pipeline = Pipeline::builder(transport.clone(), authenticator).build();

	pipeline.execute(Request::get(url("/v1/items"))).await.expect("Call should succeed.");

	let sent = transport.requests().pop().expect("Transport should see the request.");

	assert_eq!(
		sent.headers().get(header::AUTHORIZATION).expect("Bearer header must be set."),
		"Bearer opaque-token"
	);
}
