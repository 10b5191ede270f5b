// crates.io
use httpmock::prelude::*;
// self
use flow_provisioner::{
	_preludet::*,
	auth::TokenSecret,
	flow::{NodeState, Requirement},
	http::ReqwestHttpClient,
	mail::MailCapture,
	scenario::{
		EnrollFuture, FlowPlan, OTP_ROLE, Orchestrator, OtpSettings, Scenario, ScenarioUser,
		SecondFactorEnroller, email_otp_tree,
	},
	store::{MemorySecretStore, SecretStore},
};

const SEED: &str = "JBSWY3DPEHPK3PXP";

struct FixedEnroller;
impl SecondFactorEnroller for FixedEnroller {
	fn enroll<'a>(
		&'a self,
		_realm: &'a str,
		_user_id: &'a str,
		_username: &'a str,
	) -> EnrollFuture<'a> {
		Box::pin(async { Ok(TokenSecret::new(SEED)) })
	}
}

fn scenario(realm: &str) -> Scenario {
	Scenario {
		realm: realm.into(),
		roles: vec![OTP_ROLE.into()],
		users: vec![ScenarioUser::new("alice").role(OTP_ROLE).with_second_factor()],
		localization: None,
		flow: FlowPlan::Fresh(email_otp_tree(
			"orch-flow",
			"orch-forms",
			Requirement::Required,
			"orch-config",
			&OtpSettings::default(),
		)),
	}
}

async fn json_mock(server: &MockServer, method: httpmock::Method, path: &str, status: u16, body: &str) {
	server
		.mock_async(|when, then| {
			when.method(method).path(path);
			then.status(status).header("content-type", "application/json").body(body);
		})
		.await;
}

#[tokio::test]
async fn run_clears_state_then_provisions_each_realm_in_order() {
	let server = MockServer::start_async().await;
	let realm = "/admin/realms/orch";
	let flows = format!("{realm}/authentication/flows");

	json_mock(&server, POST, TOKEN_PATH, 200, TOKEN_BODY).await;
	json_mock(&server, DELETE, realm, 204, "").await;
	json_mock(&server, POST, "/admin/realms", 201, "").await;
	json_mock(
		&server,
		GET,
		&format!("{realm}/authentication/required-actions/VERIFY_PROFILE"),
		404,
		"",
	)
	.await;
	json_mock(&server, GET, &format!("{realm}/clients"), 200, "[]").await;
	json_mock(&server, POST, &format!("{realm}/clients"), 201, "").await;
	json_mock(&server, POST, &format!("{realm}/roles"), 201, "").await;
	json_mock(&server, POST, &format!("{realm}/users"), 201, "").await;
	json_mock(&server, GET, &format!("{realm}/users"), 200, "[{\"id\":\"u-1\",\"username\":\"alice\"}]")
		.await;
	json_mock(
		&server,
		GET,
		&format!("{realm}/roles/{OTP_ROLE}"),
		200,
		"{\"id\":\"r-1\",\"name\":\"otp-required\"}",
	)
	.await;
	json_mock(&server, POST, &format!("{realm}/users/u-1/role-mappings/realm"), 204, "").await;
	json_mock(
		&server,
		GET,
		&format!("{realm}/authentication/required-actions"),
		200,
		"[{\"alias\":\"CONFIGURE_TOTP\",\"name\":\"Configure OTP\",\"enabled\":true}]",
	)
	.await;
	json_mock(
		&server,
		GET,
		&format!("{realm}/authentication/required-actions/CONFIGURE_TOTP"),
		200,
		"{\"alias\":\"CONFIGURE_TOTP\",\"name\":\"Configure OTP\",\"enabled\":true}",
	)
	.await;
	json_mock(
		&server,
		GET,
		&format!("{realm}/users/u-1"),
		200,
		"{\"id\":\"u-1\",\"username\":\"alice\",\"requiredActions\":[]}",
	)
	.await;
	json_mock(&server, PUT, &format!("{realm}/users/u-1"), 204, "").await;
	json_mock(
		&server,
		GET,
		&flows,
		200,
		"[\
			{\"id\":\"f-browser\",\"alias\":\"browser\",\"providerId\":\"basic-flow\",\
			 \"topLevel\":true,\"builtIn\":true},\
			{\"id\":\"f-clients\",\"alias\":\"clients\",\"providerId\":\"client-flow\",\
			 \"topLevel\":true,\"builtIn\":true}\
		]",
	)
	.await;
	json_mock(&server, POST, &flows, 201, "").await;
	json_mock(&server, POST, &format!("{flows}/orch-flow/executions/execution"), 201, "").await;
	json_mock(&server, POST, &format!("{flows}/orch-flow/executions/flow"), 201, "").await;
	json_mock(
		&server,
		GET,
		&format!("{flows}/orch-flow/executions"),
		200,
		"[\
			{\"id\":\"e-cookie\",\"requirement\":\"DISABLED\",\"displayName\":\"Cookie\",\
			 \"providerId\":\"auth-cookie\",\"level\":0,\"index\":0},\
			{\"id\":\"e-forms\",\"requirement\":\"DISABLED\",\"displayName\":\"orch-forms\",\
			 \"authenticationFlow\":true,\"flowId\":\"f-forms\",\"level\":0,\"index\":1},\
			{\"id\":\"e-pass\",\"requirement\":\"DISABLED\",\"displayName\":\"Username Password Form\",\
			 \"providerId\":\"auth-username-password-form\",\"level\":1,\"index\":0},\
			{\"id\":\"e-otp\",\"requirement\":\"DISABLED\",\"displayName\":\"Email OTP\",\
			 \"providerId\":\"email-otp-form\",\"level\":1,\"index\":1}\
		]",
	)
	.await;
	json_mock(&server, PUT, &format!("{flows}/orch-flow/executions"), 204, "").await;
	json_mock(&server, POST, &format!("{flows}/orch-forms/executions/execution"), 201, "").await;
	json_mock(
		&server,
		GET,
		&format!("{flows}/orch-forms/executions"),
		200,
		"[\
			{\"id\":\"e-pass\",\"requirement\":\"DISABLED\",\"displayName\":\"Username Password Form\",\
			 \"providerId\":\"auth-username-password-form\",\"level\":0,\"index\":0},\
			{\"id\":\"e-otp\",\"requirement\":\"DISABLED\",\"displayName\":\"Email OTP\",\
			 \"providerId\":\"email-otp-form\",\"level\":0,\"index\":1}\
		]",
	)
	.await;
	json_mock(&server, PUT, &format!("{flows}/orch-forms/executions"), 204, "").await;

	let config = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/realms/orch/authentication/executions/e-otp/config");
			then.status(201);
		})
		.await;
	let realm_updates = server
		.mock_async(|when, then| {
			when.method(PUT).path("/admin/realms/orch");
			then.status(204);
		})
		.await;
	let purge = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/messages");
			then.status(200);
		})
		.await;
	let store = MemorySecretStore::default();

	store.put("left-over", "OLDSEED".into()).await.expect("Fixture seed should be stored.");

	let mail = MailCapture::new(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
		ReqwestHttpClient::default(),
	)
	.expect("Mail capture client should build.");
	let orchestrator = Orchestrator::new(test_provisioner(&server.base_url()), Arc::new(store.clone()))
		.with_enroller(Arc::new(FixedEnroller))
		.with_mail(mail)
		.with_scenarios(vec![scenario("orch")]);
	let report = orchestrator.run().await.expect("Provisioning run should succeed.");

	assert_eq!(report.realms.len(), 1);

	let realm = &report.realms[0];

	assert_eq!(realm.realm, "orch");
	assert_eq!(realm.entry_point, "orch-flow");
	assert_eq!(realm.users.get("alice").map(String::as_str), Some("u-1"));
	assert_eq!(realm.enrolled, ["alice"]);
	assert_eq!(realm.build.state, NodeState::Bound);
	assert_eq!(realm.build.nodes.len(), 4);
	assert!(store.get("left-over").await.expect("Get should succeed.").is_none());
	assert_eq!(
		store.get("alice").await.expect("Get should succeed.").map(|seed| seed.expose().to_owned()),
		Some(SEED.to_owned())
	);

	config.assert_async().await;
	purge.assert_async().await;
	// Mail transport, then the entry-point binding.
	realm_updates.assert_calls_async(2).await;
}

#[tokio::test]
async fn run_stops_at_the_first_failing_realm() {
	let server = MockServer::start_async().await;

	json_mock(&server, POST, TOKEN_PATH, 200, TOKEN_BODY).await;
	json_mock(&server, DELETE, "/admin/realms/first", 204, "").await;
	json_mock(&server, POST, "/admin/realms", 500, "{\"error\":\"unknown_error\"}").await;

	let second = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/admin/realms/second");
			then.status(204);
		})
		.await;
	let orchestrator = Orchestrator::new(
		test_provisioner(&server.base_url()),
		Arc::new(MemorySecretStore::default()),
	)
	.with_scenarios(vec![scenario("first"), scenario("second")]);
	let err = orchestrator.run().await.expect_err("A failed realm creation should abort the run.");

	assert!(matches!(err, Error::RemoteRejected { status: 500, .. }), "unexpected error: {err:?}");

	second.assert_calls_async(0).await;
}
