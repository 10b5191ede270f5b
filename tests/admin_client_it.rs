// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use httpmock::prelude::*;
// self
use flow_provisioner::{
	_preludet::*,
	admin::AdminClient,
	auth::{StaticTokenSource, TokenFuture, TokenSecret, TokenSource},
	config::ProvisionerConfig,
	flow::Creation,
	http::ReqwestHttpClient,
};

/// Hands out `stale` until invalidated, then `fresh`.
#[derive(Default)]
struct RotatingTokenSource {
	invalidated: AtomicBool,
}
impl TokenSource for RotatingTokenSource {
	fn access_token(&self) -> TokenFuture<'_> {
		let token = if self.invalidated.load(Ordering::SeqCst) { "fresh" } else { "stale" };

		Box::pin(async move { Ok(TokenSecret::new(token)) })
	}

	fn invalidate(&self) -> Pin<Box<dyn Future<Output = ()> + '_ + Send>> {
		Box::pin(async move {
			self.invalidated.store(true, Ordering::SeqCst);
		})
	}
}

#[tokio::test]
async fn admin_token_is_fetched_once_and_reused() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let realm = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/admin/realms/demo")
				.header("authorization", "Bearer admin-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"realm\":\"demo\",\"enabled\":true,\"browserFlow\":\"browser\"}");
		})
		.await;
	let admin = test_admin_client(&server.base_url());

	assert!(admin.realm_exists("demo").await.expect("Realm lookup should succeed."));
	assert_eq!(
		admin.realm_entry_point("demo").await.expect("Entry point lookup should succeed."),
		Some("browser".into())
	);

	token.assert_calls_async(1).await;
	realm.assert_calls_async(2).await;
}

#[tokio::test]
async fn token_inside_refresh_window_is_fetched_again() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/demo");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"realm\":\"demo\"}");
		})
		.await;

	let config = ProvisionerConfig::builder()
		.base_url(Url::parse(&server.base_url()).expect("Mock server URL should parse."))
		.admin_credentials("admin", "admin")
		.token_refresh_window(Duration::minutes(10))
		.build()
		.expect("Configuration with a wide refresh window should build.");
	let admin = AdminClient::new(&config).expect("Admin client should build.");

	admin.get_realm("demo").await.expect("First call should succeed.");
	admin.get_realm("demo").await.expect("Second call should succeed.");

	token.assert_calls_async(2).await;
}

#[tokio::test]
async fn static_token_source_sends_the_given_bearer() {
	let server = MockServer::start_async().await;
	let realm = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/demo").header("authorization", "Bearer fixed");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"realm\":\"demo\"}");
		})
		.await;
	let admin = AdminClient::with_token_source(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
		ReqwestHttpClient::default(),
		Arc::new(StaticTokenSource::new("fixed")),
	)
	.expect("Admin client should build around a static token.");

	admin.get_realm("demo").await.expect("Static bearer should be accepted.");

	realm.assert_async().await;
}

#[tokio::test]
async fn rejected_admin_grant_surfaces_token_error() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Invalid user credentials\"}");
		})
		.await;
	let admin = test_admin_client(&server.base_url());
	let err = admin.realm_exists("demo").await.expect_err("A refused grant should fail the call.");

	assert!(matches!(err, Error::TokenRejected { .. }), "unexpected error: {err:?}");

	token.assert_async().await;
}

#[tokio::test]
async fn unauthorized_response_invalidates_token_and_retries_once() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/demo").header("authorization", "Bearer stale");
			then.status(401);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/demo").header("authorization", "Bearer fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"realm\":\"demo\"}");
		})
		.await;
	let admin = AdminClient::with_token_source(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
		ReqwestHttpClient::default(),
		Arc::new(RotatingTokenSource::default()),
	)
	.expect("Admin client should build around a custom token source.");
	let realm = admin.get_realm("demo").await.expect("Retried call should succeed.");

	assert_eq!(realm.realm, "demo");

	stale.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn conflict_on_creation_counts_as_existing() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	let roles = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/admin/realms/demo/roles")
				.json_body(serde_json::json!({ "name": "otp-required" }));
			then.status(409).body("{\"errorMessage\":\"Role with name otp-required already exists\"}");
		})
		.await;
	let admin = test_admin_client(&server.base_url());
	let creation =
		admin.create_role("demo", "otp-required").await.expect("Conflict should be absorbed.");

	assert_eq!(creation, Creation::AlreadyExists);

	roles.assert_async().await;
}

#[tokio::test]
async fn other_failures_carry_endpoint_status_and_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/realms/demo/roles");
			then.status(400).body("{\"error\":\"invalid role\"}");
		})
		.await;

	let admin = test_admin_client(&server.base_url());
	let err = admin.create_role("demo", "").await.expect_err("A 400 should be reported.");

	match err {
		Error::RemoteRejected { method, endpoint, status, body } => {
			assert_eq!(method, "POST");
			assert_eq!(endpoint, "/admin/realms/demo/roles");
			assert_eq!(status, 400);
			assert_eq!(body, "{\"error\":\"invalid role\"}");
		},
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn malformed_bodies_name_the_offending_path() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/demo/roles/otp-required");
			then.status(200).header("content-type", "application/json").body("{\"id\":7,\"name\":\"x\"}");
		})
		.await;

	let admin = test_admin_client(&server.base_url());
	let err = admin.get_role("demo", "otp-required").await.expect_err("Numeric ids should not decode.");

	match err {
		Error::Decode { endpoint, source } => {
			assert_eq!(endpoint, "/admin/realms/demo/roles/otp-required");
			assert_eq!(source.path().to_string(), "id");
		},
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn missing_realm_is_reported_as_absent() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/admin/realms/ghost");
			then.status(404).body("{\"error\":\"Realm not found.\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/admin/realms/ghost");
			then.status(404).body("{\"error\":\"Realm not found.\"}");
		})
		.await;

	let admin = test_admin_client(&server.base_url());

	assert!(!admin.realm_exists("ghost").await.expect("A 404 should map to absence."));
	assert!(!admin.delete_realm("ghost").await.expect("Deleting a missing realm should succeed."));
}
