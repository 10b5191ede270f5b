// crates.io
use httpmock::prelude::*;
// self
use flow_provisioner::{
	_preludet::*,
	http::ReqwestHttpClient,
	mail::{DEFAULT_CODE_ALPHABET, DEFAULT_CODE_LENGTHS, MailCapture, extract_code},
	poll::PollPolicy,
};

const LISTING: &str = "{\"total\":2,\"messages\":[\
	{\"ID\":\"m-2\",\"To\":[{\"Name\":\"\",\"Address\":\"someone@test.local\"}],\"Subject\":\"Welcome\"},\
	{\"ID\":\"m-1\",\"To\":[{\"Name\":\"\",\"Address\":\"Trust-User@test.local\"}],\"Subject\":\"Access code\"}\
]}";
const MESSAGE: &str = "{\"ID\":\"m-1\",\
	\"From\":{\"Name\":\"Keycloak Test\",\"Address\":\"keycloak@test.local\"},\
	\"To\":[{\"Name\":\"\",\"Address\":\"trust-user@test.local\"}],\
	\"Subject\":\"Access code\",\
	\"Text\":\"Your access code is: K7M2QX\\nIt expires in 10 minutes.\",\
	\"HTML\":\"<p>Your access code is: <b>K7M2QX</b></p>\"}";

fn capture(server: &MockServer, policy: PollPolicy) -> MailCapture {
	MailCapture::new(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
		ReqwestHttpClient::default(),
	)
	.expect("Mail capture client should build.")
	.with_policy(policy)
}

#[tokio::test]
async fn waits_for_the_matching_message_and_extracts_its_code() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/messages");
			then.status(200).header("content-type", "application/json").body(LISTING);
		})
		.await;

	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/message/m-1");
			then.status(200).header("content-type", "application/json").body(MESSAGE);
		})
		.await;
	let mail = capture(&server, PollPolicy::new(StdDuration::from_secs(5), StdDuration::from_millis(50)));
	let message = mail
		.wait_for_message("trust-user@test.local", Some("access CODE"))
		.await
		.expect("The matching message should be found.");

	assert_eq!(message.id, "m-1");
	assert_eq!(
		extract_code(&message, DEFAULT_CODE_ALPHABET, DEFAULT_CODE_LENGTHS).as_deref(),
		Some("K7M2QX")
	);

	fetch.assert_async().await;
}

#[tokio::test]
async fn wait_times_out_when_nothing_matches() {
	let server = MockServer::start_async().await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/messages");
			then.status(200).header("content-type", "application/json").body(LISTING);
		})
		.await;
	let mail = capture(&server, PollPolicy::default());
	let err = mail
		.wait_for_message_with(
			"nobody@test.local",
			None,
			PollPolicy::new(StdDuration::from_millis(300), StdDuration::from_millis(50)),
		)
		.await
		.expect_err("No message should match.");

	match err {
		Error::Timeout { criteria, elapsed } => {
			assert_eq!(criteria, "mail to nobody@test.local");
			assert!(elapsed >= StdDuration::from_millis(300));
		},
		other => panic!("unexpected error: {other:?}"),
	}

	assert!(listing.calls_async().await >= 2);
}

#[tokio::test]
async fn purge_deletes_every_captured_message() {
	let server = MockServer::start_async().await;
	let purge = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/messages");
			then.status(200).body("ok");
		})
		.await;

	capture(&server, PollPolicy::default()).delete_all().await.expect("Purge should succeed.");

	purge.assert_async().await;
}

#[tokio::test]
async fn capture_errors_are_reported_with_status() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/messages");
			then.status(503).body("unavailable");
		})
		.await;

	let err = capture(&server, PollPolicy::default())
		.list_messages()
		.await
		.expect_err("A 503 should be reported.");

	assert!(matches!(err, Error::RemoteRejected { status: 503, .. }), "unexpected error: {err:?}");
}
