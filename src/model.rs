//! Resource categories, projections, and the normalized page/item shapes.

// self
use crate::_prelude::*;

/// Error returned when an inbound selector cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SelectorError {
	/// The category selector named no category at all.
	#[error("At least one category must be requested.")]
	EmptyCategories,
	/// The category selector named an unknown category.
	#[error("Unknown category `{value}`; expected likes, retweets, or replies.")]
	UnknownCategory {
		/// Offending selector fragment.
		value: String,
	},
	/// The projection selector is not recognized.
	#[error("Unknown projection `{value}`; expected raw, usernames, or ids.")]
	UnknownProjection {
		/// Offending selector value.
		value: String,
	},
}

/// Kind of engagement collected for a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	/// Accounts that liked the post.
	Likes,
	/// Accounts that reposted the post.
	Retweets,
	/// Authors of posts in the reply thread.
	Replies,
}
impl Category {
	/// Every category, in response order.
	pub const ALL: [Category; 3] = [Category::Likes, Category::Retweets, Category::Replies];

	/// Returns the stable category label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Category::Likes => "likes",
			Category::Retweets => "retweets",
			Category::Replies => "replies",
		}
	}

	/// Smallest page size the remote endpoint accepts.
	pub const fn min_page_size(self) -> u32 {
		match self {
			Category::Replies => 10,
			Category::Likes | Category::Retweets => 1,
		}
	}

	/// Largest page size the remote endpoint accepts.
	pub const fn max_page_size(self) -> u32 {
		100
	}

	/// Clamps a requested page size into the endpoint's accepted range.
	pub fn clamp_page_size(self, requested: u32) -> u32 {
		requested.clamp(self.min_page_size(), self.max_page_size())
	}
}
impl Display for Category {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Category {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"likes" | "like" => Ok(Category::Likes),
			"retweets" | "retweet" | "reposts" => Ok(Category::Retweets),
			"replies" | "reply" => Ok(Category::Replies),
			_ => Err(SelectorError::UnknownCategory { value: s.trim().to_owned() }),
		}
	}
}

/// Non-empty set of requested categories; defaults to all three.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySet(BTreeSet<Category>);
impl CategorySet {
	/// Builds a set from the provided categories; duplicates collapse.
	pub fn new(categories: impl IntoIterator<Item = Category>) -> Result<Self, SelectorError> {
		let set = categories.into_iter().collect::<BTreeSet<_>>();

		if set.is_empty() {
			return Err(SelectorError::EmptyCategories);
		}

		Ok(Self(set))
	}

	/// Returns `true` when the category was requested.
	pub fn contains(&self, category: Category) -> bool {
		self.0.contains(&category)
	}

	/// Iterates the requested categories in response order.
	pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
		self.0.iter().copied()
	}

	/// Number of requested categories.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false`; construction rejects empty sets.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Default for CategorySet {
	fn default() -> Self {
		Self(Category::ALL.into_iter().collect())
	}
}
impl FromStr for CategorySet {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let categories = s
			.split(',')
			.filter(|part| !part.trim().is_empty())
			.map(Category::from_str)
			.collect::<Result<Vec<_>, _>>()?;

		Self::new(categories)
	}
}

/// Shape in which aggregated data is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
	/// Full normalized records per category.
	Raw,
	/// Usernames per category; records without a resolved username are dropped.
	#[default]
	Usernames,
	/// One deduplicated set of participant identifiers across all categories.
	ParticipantIds,
}
impl FromStr for Projection {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"raw" => Ok(Projection::Raw),
			"usernames" | "names" => Ok(Projection::Usernames),
			"ids" | "participants" | "participant_ids" => Ok(Projection::ParticipantIds),
			_ => Err(SelectorError::UnknownProjection { value: s.trim().to_owned() }),
		}
	}
}

/// One engagement record, normalized across categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	/// Category the record was collected from.
	pub category: Category,
	/// Identifier of the engaging account (the reply author for replies).
	pub user_id: String,
	/// Username of the engaging account, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Creation instant of the reply; the like/repost endpoints do not report one.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Identifier of the reply post itself (replies only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reply_id: Option<String>,
}
impl Item {
	/// Creates a record for an engaging account.
	pub fn new(category: Category, user_id: impl Into<String>) -> Self {
		Self { category, user_id: user_id.into(), username: None, created_at: None, reply_id: None }
	}

	/// Attaches a username.
	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Attaches a creation instant.
	pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
		self.created_at = Some(created_at);

		self
	}

	/// Attaches the reply post identifier.
	pub fn with_reply_id(mut self, reply_id: impl Into<String>) -> Self {
		self.reply_id = Some(reply_id.into());

		self
	}
}

/// Parameters of one page call. Immutable per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
	/// Post identifier (likes/retweets) or conversation identifier (replies).
	pub resource_id: String,
	/// Cursor returned by the previous page; `None` for the first page.
	pub cursor: Option<String>,
	/// Requested page size, already clamped to the endpoint bounds.
	pub page_size: u32,
}

/// Account from the user expansion list that accompanies a search page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedUser {
	/// Account identifier.
	pub id: String,
	/// Account username.
	pub username: String,
}

/// Normalized result of one page call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
	/// Records in remote order.
	pub items: Vec<Item>,
	/// User expansions returned alongside the page (replies only).
	pub users: Vec<ExpandedUser>,
	/// Cursor of the next page; `None` ends pagination.
	pub next_cursor: Option<String>,
}
