//! Client for the mail-capture API plus one-time-code extraction.
//!
//! Messages are listed, fetched, and purged over plain JSON endpoints. Waiting for a message runs
//! through the [`Poller`], so the wait is bounded by the configured [`PollPolicy`].

// std
use std::ops::RangeInclusive;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ProvisionerConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	poll::{PollPolicy, Poller},
};

/// Alphabet of generated codes when the authenticator keeps its defaults.
pub const DEFAULT_CODE_ALPHABET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
/// Code lengths accepted by [`extract_code`] callers that keep the defaults.
pub const DEFAULT_CODE_LENGTHS: RangeInclusive<usize> = 4..=8;

/// Mailbox address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Email address.
	pub address: String,
}

/// Entry of the message listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageSummary {
	/// Capture-assigned id.
	#[serde(rename = "ID")]
	pub id: String,
	/// Sender.
	#[serde(default)]
	pub from: Option<Address>,
	/// Recipients.
	#[serde(default)]
	pub to: Vec<Address>,
	/// Subject line.
	#[serde(default)]
	pub subject: String,
	/// Body preview.
	#[serde(default)]
	pub snippet: String,
}
impl MessageSummary {
	/// Returns `true` when a recipient equals `to` ignoring case and, if given, the subject
	/// contains `subject` ignoring case.
	pub fn matches(&self, to: &str, subject: Option<&str>) -> bool {
		let to_matches = self.to.iter().any(|recipient| recipient.address.eq_ignore_ascii_case(to));
		let subject_matches = subject
			.is_none_or(|needle| self.subject.to_lowercase().contains(&needle.to_lowercase()));

		to_matches && subject_matches
	}
}

#[derive(Debug, Deserialize)]
struct MessageList {
	#[serde(default)]
	messages: Vec<MessageSummary>,
}

/// Full message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
	/// Capture-assigned id.
	#[serde(rename = "ID")]
	pub id: String,
	/// Sender.
	#[serde(default)]
	pub from: Option<Address>,
	/// Recipients.
	#[serde(default)]
	pub to: Vec<Address>,
	/// Subject line.
	#[serde(default)]
	pub subject: String,
	/// Plain-text body.
	#[serde(default)]
	pub text: String,
	/// HTML body.
	#[serde(default, rename = "HTML")]
	pub html: String,
}

/// Client for the mail-capture API.
#[derive(Clone, Debug)]
pub struct MailCapture {
	http: ReqwestHttpClient,
	base_url: Url,
	poller: Poller,
}
impl MailCapture {
	/// Builds a client rooted at `base_url`.
	pub fn new(base_url: Url, http: ReqwestHttpClient) -> Result<Self> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidUrl { what: "mail capture", source: None }.into());
		}

		Ok(Self { http, base_url, poller: Poller::default() })
	}

	/// Builds a client from `config`, or `None` when no mail-capture URL is configured.
	pub fn from_config(config: &ProvisionerConfig) -> Result<Option<Self>> {
		let Some(base_url) = config.mail_url.clone() else {
			return Ok(None);
		};
		let http = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Ok(Some(Self::new(base_url, http)?.with_policy(config.poll)))
	}

	/// Overrides the default wait policy.
	pub fn with_policy(mut self, policy: PollPolicy) -> Self {
		self.poller = Poller::new(policy);

		self
	}

	/// Deletes every captured message.
	pub async fn delete_all(&self) -> Result<()> {
		let url = self.endpoint(["messages"])?;
		let response = self.http.delete(url.clone()).send().await?;

		check(&Method::DELETE, &url, response).await.map(|_| ())
	}

	/// Lists captured messages, newest first.
	pub async fn list_messages(&self) -> Result<Vec<MessageSummary>> {
		let list: MessageList = self.get_json(self.endpoint(["messages"])?).await?;

		Ok(list.messages)
	}

	/// Fetches one message with its bodies.
	pub async fn get_message(&self, id: &str) -> Result<Message> {
		self.get_json(self.endpoint(["message", id])?).await
	}

	/// Waits under the default policy for a message to `to`, optionally filtered by subject.
	pub async fn wait_for_message(&self, to: &str, subject: Option<&str>) -> Result<Message> {
		self.wait_for_message_with(to, subject, self.poller.policy()).await
	}

	/// Waits under `policy` for a message to `to`, optionally filtered by subject.
	pub async fn wait_for_message_with(
		&self,
		to: &str,
		subject: Option<&str>,
		policy: PollPolicy,
	) -> Result<Message> {
		let criteria = match subject {
			Some(subject) => format!("mail to {to} with subject containing \"{subject}\""),
			None => format!("mail to {to}"),
		};
		let summary = Poller::new(policy)
			.poll(criteria, || self.list_messages(), |message| message.matches(to, subject))
			.await?;

		self.get_message(&summary.id).await
	}

	fn endpoint<const N: usize>(&self, segments: [&str; N]) -> Result<Url> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl { what: "mail capture", source: None })?
			.pop_if_empty()
			.extend(["api", "v1"])
			.extend(segments);

		Ok(url)
	}

	async fn get_json<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.http.get(url.clone()).send().await?;
		let bytes = check(&Method::GET, &url, response).await?.bytes().await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { endpoint: url.path().to_owned(), source })
	}
}

async fn check(method: &Method, url: &Url, response: reqwest::Response) -> Result<reqwest::Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.unwrap_or_default();

	Err(Error::rejected(method, url.path(), status, body))
}

/// Finds the first code in `message`: the plain-text body is searched, or the HTML body when the
/// text body is blank.
pub fn extract_code(
	message: &Message,
	alphabet: &str,
	lengths: RangeInclusive<usize>,
) -> Option<String> {
	let body = if message.text.trim().is_empty() { &message.html } else { &message.text };

	find_code(body, alphabet, lengths)
}

/// Returns the first whole word of `body` made only of `alphabet` characters whose length lies in
/// `lengths`. Words are maximal runs of ASCII letters, digits, and underscores.
pub fn find_code(body: &str, alphabet: &str, lengths: RangeInclusive<usize>) -> Option<String> {
	body.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
		.find(|word| {
			lengths.contains(&word.chars().count()) && word.chars().all(|c| alphabet.contains(c))
		})
		.map(str::to_owned)
}
