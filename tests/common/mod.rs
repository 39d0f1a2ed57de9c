//! In-process fakes shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use engagement_harvest::{
	auth::{
		AuthorizationExchange, Credential, CredentialHolder, ExchangeFuture, ExchangedTokens,
		TokenSecret,
	},
	error::{Error, Result},
	model::{Category, ExpandedUser, Item, Page, PageRequest},
	transport::{PageFuture, ResourceTransport},
};

/// Call observed by [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
	pub category: Category,
	pub resource_id: String,
	pub cursor: Option<String>,
	pub bearer: String,
}

/// Transport answering from per-category scripts.
///
/// Requests presenting a bearer listed in `rejected` fail with `Unauthenticated` without
/// consuming the script; an exhausted script answers with an empty final page.
#[derive(Default)]
pub struct ScriptedTransport {
	scripts: Mutex<HashMap<Category, VecDeque<Result<Page>>>>,
	rejected: Mutex<Vec<String>>,
	calls: Mutex<Vec<Call>>,
	latency: Mutex<HashMap<Category, Duration>>,
}
impl ScriptedTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn script(&self, category: Category, pages: impl IntoIterator<Item = Result<Page>>) {
		self.scripts.lock().entry(category).or_default().extend(pages);
	}

	pub fn reject(&self, bearer: &str) {
		self.rejected.lock().push(bearer.to_owned());
	}

	pub fn slow(&self, category: Category, latency: Duration) {
		self.latency.lock().insert(category, latency);
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn calls_for(&self, category: Category) -> Vec<Call> {
		self.calls().into_iter().filter(|call| call.category == category).collect()
	}
}
impl ResourceTransport for ScriptedTransport {
	fn fetch_page<'a>(
		&'a self,
		category: Category,
		request: &'a PageRequest,
		bearer: &'a TokenSecret,
	) -> PageFuture<'a> {
		Box::pin(async move {
			let latency = self.latency.lock().get(&category).copied();

			if let Some(latency) = latency {
				tokio::time::sleep(latency).await;
			}

			self.calls.lock().push(Call {
				category,
				resource_id: request.resource_id.clone(),
				cursor: request.cursor.clone(),
				bearer: bearer.expose().to_owned(),
			});

			if self.rejected.lock().iter().any(|rejected| rejected == bearer.expose()) {
				return Err(Error::Unauthenticated);
			}

			self.scripts
				.lock()
				.get_mut(&category)
				.and_then(VecDeque::pop_front)
				.unwrap_or_else(|| Ok(Page::default()))
		})
	}
}

/// Exchange minting `access-N` tokens and counting how often it ran.
///
/// A single-use exchange spends each refresh token when the call starts, the way a
/// rotating provider does, and rejects a spent token with `invalid_grant`.
#[derive(Default)]
pub struct CountingExchange {
	count: AtomicU32,
	latency: Duration,
	failure: Option<String>,
	single_use: bool,
	spent: Mutex<Vec<String>>,
}
impl CountingExchange {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn slow(latency: Duration) -> Arc<Self> {
		Arc::new(Self { latency, ..Default::default() })
	}

	pub fn failing(reason: &str, latency: Duration) -> Arc<Self> {
		Arc::new(Self { latency, failure: Some(reason.to_owned()), ..Default::default() })
	}

	pub fn single_use(latency: Duration) -> Arc<Self> {
		Arc::new(Self { latency, single_use: true, ..Default::default() })
	}

	pub fn count(&self) -> u32 {
		self.count.load(Ordering::SeqCst)
	}
}
impl AuthorizationExchange for CountingExchange {
	fn exchange<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;

			if self.single_use {
				let mut spent = self.spent.lock();

				if spent.iter().any(|token| token == refresh_token.expose()) {
					return Err(Error::credential_unavailable("invalid_grant"));
				}

				spent.push(refresh_token.expose().to_owned());
			}

			if !self.latency.is_zero() {
				tokio::time::sleep(self.latency).await;
			}

			match &self.failure {
				Some(reason) => Err(Error::credential_unavailable(reason)),
				None => Ok(ExchangedTokens::new(format!("access-{n}"))
					.with_refresh_token(format!("refresh-{n}"))),
			}
		})
	}
}

pub fn seed() -> Credential {
	Credential::new("access-0").with_refresh_token("refresh-0")
}

pub fn refreshing_holder(exchange: Arc<CountingExchange>) -> Arc<CredentialHolder> {
	Arc::new(CredentialHolder::new(seed(), exchange))
}

pub fn users(category: Category, users: &[(&str, &str)], cursor: Option<&str>) -> Result<Page> {
	Ok(Page {
		items: users
			.iter()
			.map(|(id, username)| Item::new(category, *id).with_username(*username))
			.collect(),
		users: Vec::new(),
		next_cursor: cursor.map(Into::into),
	})
}

pub fn replies(
	authors: &[&str],
	expansions: &[(&str, &str)],
	cursor: Option<&str>,
) -> Result<Page> {
	Ok(Page {
		items: authors
			.iter()
			.enumerate()
			.map(|(i, author)| Item::new(Category::Replies, *author).with_reply_id(format!("r{i}")))
			.collect(),
		users: expansions
			.iter()
			.map(|(id, username)| ExpandedUser { id: (*id).into(), username: (*username).into() })
			.collect(),
		next_cursor: cursor.map(Into::into),
	})
}
