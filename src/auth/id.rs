//! Numeric post and conversation identifiers validated at the inbound boundary.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` as a decimal identifier.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

// Snowflake identifiers fit in 19 decimal digits; leave headroom for other deployments.
const IDENTIFIER_MAX_LEN: usize = 32;

/// Why an inbound post or conversation identifier was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier is empty.")]
	Empty {
		/// Kind of identifier (post, conversation).
		kind: &'static str,
	},
	/// The identifier contains something other than ASCII digits.
	#[error("{kind} identifier must consist of ASCII digits.")]
	NonNumeric {
		/// Kind of identifier (post, conversation).
		kind: &'static str,
	},
	/// More digits than any deployment issues.
	#[error("{kind} identifier is longer than {max} digits.")]
	TooLong {
		/// Kind of identifier (post, conversation).
		kind: &'static str,
		/// Digit limit.
		max: usize,
	},
}

def_id! { PostId, "Identifier of the post whose engagement is collected.", "Post" }
def_id! { ConversationId, "Identifier of the reply thread rooted at a post.", "Conversation" }

impl PostId {
	/// Conversation rooted at this post; a root post shares its identifier with its thread.
	pub fn conversation(&self) -> ConversationId {
		ConversationId(self.0.clone())
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !view.bytes().all(|b| b.is_ascii_digit()) {
		return Err(IdentifierError::NonNumeric { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
