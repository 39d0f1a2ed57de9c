//! Serde shapes of the remote API's v2 responses and their mapping onto [`Page`].

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	error::MalformedError,
	model::{Category, ExpandedUser, Item, Page},
};

#[derive(Debug, Deserialize)]
struct UsersPage {
	#[serde(default)]
	data: Option<Vec<WireUser>>,
	#[serde(default)]
	meta: WireMeta,
	#[serde(default)]
	errors: Vec<WireProblem>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
	#[serde(default)]
	data: Option<Vec<WireTweet>>,
	#[serde(default)]
	includes: WireIncludes,
	#[serde(default)]
	meta: WireMeta,
	#[serde(default)]
	errors: Vec<WireProblem>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
	id: String,
	username: String,
}

#[derive(Debug, Deserialize)]
struct WireTweet {
	id: String,
	author_id: Option<String>,
	created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireIncludes {
	#[serde(default)]
	users: Vec<WireUser>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMeta {
	next_token: Option<String>,
}

// Problems arrive both as v2 "problem" objects and as legacy `{code, message}` pairs.
#[derive(Debug, Deserialize)]
struct WireProblem {
	title: Option<String>,
	detail: Option<String>,
	message: Option<String>,
}
impl WireProblem {
	fn describe(&self) -> String {
		match (&self.title, &self.detail, &self.message) {
			(Some(title), Some(detail), _) => format!("{title}: {detail}"),
			(_, Some(detail), _) => detail.clone(),
			(Some(title), None, _) => title.clone(),
			(None, None, Some(message)) => message.clone(),
			(None, None, None) => "unspecified problem".into(),
		}
	}
}

/// Parses a successful response body for `category` into a normalized [`Page`].
pub(crate) fn parse_page(category: Category, status: u16, body: &[u8]) -> Result<Page> {
	match category {
		Category::Likes | Category::Retweets => {
			let page = deserialize::<UsersPage>(status, body)?;
			let Some(users) = page.data else {
				return empty_or_problem(page.errors, page.meta);
			};

			Ok(Page {
				items: users
					.into_iter()
					.map(|user| Item::new(category, user.id).with_username(user.username))
					.collect(),
				users: Vec::new(),
				next_cursor: page.meta.next_token,
			})
		},
		Category::Replies => {
			let page = deserialize::<SearchPage>(status, body)?;
			let Some(tweets) = page.data else {
				return empty_or_problem(page.errors, page.meta);
			};
			let items = tweets
				.into_iter()
				// Replies without an author expansion cannot name a participant.
				.filter_map(|tweet| {
					let author = tweet.author_id?;

					Some(reply_item(author, tweet.id, tweet.created_at))
				})
				.collect::<Result<Vec<_>>>()?;

			Ok(Page {
				items,
				users: page
					.includes
					.users
					.into_iter()
					.map(|user| ExpandedUser { id: user.id, username: user.username })
					.collect(),
				next_cursor: page.meta.next_token,
			})
		},
	}
}

fn deserialize<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| MalformedError::Json { source, status: Some(status) }.into())
}

fn empty_or_problem(errors: Vec<WireProblem>, meta: WireMeta) -> Result<Page> {
	if errors.is_empty() {
		return Ok(Page { next_cursor: meta.next_token, ..Page::default() });
	}

	let detail = errors.iter().map(WireProblem::describe).collect::<Vec<_>>().join("; ");

	Err(MalformedError::Problem { detail }.into())
}

fn reply_item(author: String, reply_id: String, created_at: Option<String>) -> Result<Item> {
	let item = Item::new(Category::Replies, author).with_reply_id(reply_id);

	match created_at {
		Some(raw) => {
			let instant = OffsetDateTime::parse(&raw, &Rfc3339)
				.map_err(|_| MalformedError::Timestamp { value: raw.clone() })?;

			Ok(item.with_created_at(instant))
		},
		None => Ok(item),
	}
}
