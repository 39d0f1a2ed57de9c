//! Aggregation of the requested categories into one projected result.
//!
//! Every requested category runs its own drain; the drains execute concurrently inside
//! the caller's task and share only the [`CredentialHolder`]. Dropping the future returned
//! by [`Aggregator::aggregate`] (client disconnect, deadline) drops every in-flight drain
//! with it, so no page is fetched for a response nobody reads.

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	auth::{ConversationId, CredentialHolder, PostId},
	config::{FailurePolicy, HarvestConfig},
	error::{ConfigError, FailureKind},
	model::{Category, CategorySet, Item, Projection},
	obs::{self, OpKind, OpOutcome, OpSpan},
	paginate::Paginator,
	transport::ResourceTransport,
};
#[cfg(feature = "reqwest")]
use crate::{
	auth::Credential, http::ReqwestHttpClient, oauth::OAuth2RefreshExchange,
	transport::ReqwestTransport,
};

/// Failure of an aggregate request.
#[derive(Debug, ThisError)]
pub enum AggregateError {
	/// A requested category failed; under fail-fast this fails the whole request.
	#[error("Category `{category}` failed: {source}")]
	Category {
		/// Category whose drain failed.
		category: Category,
		/// Failure that aborted the drain.
		#[source]
		source: Error,
	},
	/// The request deadline elapsed; all category pipelines were cancelled.
	#[error("Aggregate request did not finish within {after:?}.")]
	TimedOut {
		/// Configured deadline.
		after: std::time::Duration,
	},
}
impl AggregateError {
	/// Classification of the failure.
	pub fn kind(&self) -> FailureKind {
		match self {
			Self::Category { source, .. } => source.kind(),
			Self::TimedOut { .. } => FailureKind::TimedOut,
		}
	}

	/// Category that caused the failure, if any.
	pub fn category(&self) -> Option<Category> {
		match self {
			Self::Category { category, .. } => Some(*category),
			Self::TimedOut { .. } => None,
		}
	}
}

/// Inbound aggregate request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateRequest {
	/// Post whose engagement is collected.
	pub post_id: PostId,
	/// Reply thread to search; defaults to the thread rooted at `post_id`.
	pub conversation: Option<ConversationId>,
	/// Requested categories.
	pub categories: CategorySet,
	/// Requested result shape.
	pub projection: Projection,
}
impl AggregateRequest {
	/// Requests every category in the default (usernames) projection.
	pub fn new(post_id: PostId) -> Self {
		Self {
			post_id,
			conversation: None,
			categories: CategorySet::default(),
			projection: Projection::default(),
		}
	}

	/// Builds a request from raw inbound values; absent selectors take their defaults.
	///
	/// ```
	/// use engagement_harvest::{aggregate::AggregateRequest, model::{Category, Projection}};
	///
	/// let request = AggregateRequest::from_query("42", Some("likes, replies"), Some("ids"))?;
	///
	/// assert!(!request.categories.contains(Category::Retweets));
	/// assert_eq!(request.projection, Projection::ParticipantIds);
	/// # Ok::<_, engagement_harvest::error::ConfigError>(())
	/// ```
	pub fn from_query(
		post_id: &str,
		categories: Option<&str>,
		projection: Option<&str>,
	) -> Result<Self, ConfigError> {
		let mut request = Self::new(PostId::new(post_id.trim())?);

		if let Some(categories) = categories {
			request.categories = categories.parse()?;
		}
		if let Some(projection) = projection {
			request.projection = projection.parse()?;
		}

		Ok(request)
	}

	/// Overrides the requested categories.
	pub fn with_categories(mut self, categories: CategorySet) -> Self {
		self.categories = categories;

		self
	}

	/// Overrides the projection.
	pub fn with_projection(mut self, projection: Projection) -> Self {
		self.projection = projection;

		self
	}

	/// Searches replies in `conversation` instead of the thread rooted at the post.
	pub fn with_conversation(mut self, conversation: ConversationId) -> Self {
		self.conversation = Some(conversation);

		self
	}

	/// Conversation searched for replies.
	pub fn conversation_id(&self) -> ConversationId {
		self.conversation.clone().unwrap_or_else(|| self.post_id.conversation())
	}

	fn resource_id(&self, category: Category) -> String {
		match category {
			Category::Likes | Category::Retweets => self.post_id.to_string(),
			Category::Replies => self.conversation_id().to_string(),
		}
	}
}

/// Projected data of the categories that completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AggregateResult {
	/// Full records per category, in remote order.
	Raw(BTreeMap<Category, Vec<Item>>),
	/// Usernames per category, in remote order; unresolved records are dropped.
	Usernames(BTreeMap<Category, Vec<String>>),
	/// Deduplicated participant identifiers across every category.
	ParticipantIds(Vec<String>),
}
impl AggregateResult {
	fn project(projection: Projection, collected: Vec<(Category, Vec<Item>)>) -> Self {
		match projection {
			Projection::Raw => Self::Raw(collected.into_iter().collect()),
			Projection::Usernames => Self::Usernames(
				collected
					.into_iter()
					.map(|(category, items)| {
						(category, items.into_iter().filter_map(|item| item.username).collect())
					})
					.collect(),
			),
			Projection::ParticipantIds => Self::ParticipantIds(
				collected
					.into_iter()
					.flat_map(|(_, items)| items)
					.map(|item| item.user_id)
					.collect::<BTreeSet<_>>()
					.into_iter()
					.collect(),
			),
		}
	}

	/// Categories present in the result; empty for the participant projection.
	pub fn categories(&self) -> Vec<Category> {
		match self {
			Self::Raw(map) => map.keys().copied().collect(),
			Self::Usernames(map) => map.keys().copied().collect(),
			Self::ParticipantIds(_) => Vec::new(),
		}
	}

	/// Usernames collected for `category` under the usernames projection.
	pub fn usernames(&self, category: Category) -> Option<&[String]> {
		match self {
			Self::Usernames(map) => map.get(&category).map(Vec::as_slice),
			_ => None,
		}
	}

	/// Records collected for `category` under the raw projection.
	pub fn items(&self, category: Category) -> Option<&[Item]> {
		match self {
			Self::Raw(map) => map.get(&category).map(Vec::as_slice),
			_ => None,
		}
	}

	/// Participant set under the participant projection.
	pub fn participants(&self) -> Option<&[String]> {
		match self {
			Self::ParticipantIds(ids) => Some(ids),
			_ => None,
		}
	}
}

/// Category reported as failed under [`FailurePolicy::Partial`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryFailure {
	/// Failed category.
	pub category: Category,
	/// Failure classification.
	pub kind: FailureKind,
	/// Human-readable cause.
	pub message: String,
}

/// Outcome of a successful aggregate request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Aggregate {
	/// Projected data.
	pub result: AggregateResult,
	/// Failed categories; always empty under [`FailurePolicy::FailFast`].
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub failures: Vec<CategoryFailure>,
}

/// Runs requested categories through their drains and projects the outcome.
#[derive(Clone, Debug)]
pub struct Aggregator {
	paginator: Paginator,
	failure_policy: FailurePolicy,
	request_timeout: Option<std::time::Duration>,
}
impl Aggregator {
	/// Creates a fail-fast aggregator without a request deadline.
	pub fn new(paginator: Paginator) -> Self {
		Self { paginator, failure_policy: FailurePolicy::FailFast, request_timeout: None }
	}

	/// Creates an aggregator whose paginator, policy, and deadline come from [`HarvestConfig`].
	pub fn from_config(
		transport: Arc<dyn ResourceTransport>,
		holder: Arc<CredentialHolder>,
		config: &HarvestConfig,
	) -> Self {
		Self::new(Paginator::from_config(transport, holder, config))
			.with_failure_policy(config.failure_policy)
			.with_request_timeout(config.request_timeout())
	}

	/// Wires the reqwest transport and, when a client id is configured, the OAuth 2.0
	/// refresh exchange around `seed`.
	#[cfg(feature = "reqwest")]
	pub fn connect(config: &HarvestConfig, seed: Credential) -> Result<Self> {
		config.validate()?;

		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout())?;
		let transport = ReqwestTransport::new(http_client.clone(), config.api_base.clone());
		let holder = match OAuth2RefreshExchange::from_config(config, http_client)? {
			Some(exchange) => CredentialHolder::new(seed, Arc::new(exchange)),
			None => CredentialHolder::without_refresh(seed),
		};

		Ok(Self::from_config(Arc::new(transport), Arc::new(holder), config))
	}

	/// Overrides the failure policy.
	pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.failure_policy = policy;

		self
	}

	/// Sets (or clears) the request deadline.
	pub fn with_request_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Credential holder shared by every request.
	pub fn holder(&self) -> &CredentialHolder {
		self.paginator.holder()
	}

	/// Collects every requested category and shapes the result.
	///
	/// Under [`FailurePolicy::FailFast`] the first failing category cancels the others and
	/// fails the request. Under [`FailurePolicy::Partial`] failing categories are listed in
	/// [`Aggregate::failures`]; the request only fails when no category succeeded.
	pub async fn aggregate(&self, request: &AggregateRequest) -> Result<Aggregate, AggregateError> {
		const KIND: OpKind = OpKind::Aggregate;

		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let pipelines = span.instrument(self.run(request));
		let outcome = match self.request_timeout {
			Some(after) => tokio::time::timeout(after, pipelines)
				.await
				.unwrap_or(Err(AggregateError::TimedOut { after })),
			None => pipelines.await,
		};

		match &outcome {
			Ok(aggregate) => {
				for failure in &aggregate.failures {
					span.warn(format_args!("{} omitted: {}", failure.category, failure.message));
				}

				obs::record_op_outcome(KIND, OpOutcome::Success);
			},
			Err(err) => {
				span.warn(err);
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		outcome
	}

	async fn run(&self, request: &AggregateRequest) -> Result<Aggregate, AggregateError> {
		let drains = request.categories.iter().map(|category| async move {
			self.paginator
				.drain(category, request.resource_id(category))
				.collect()
				.await
				.map(|items| (category, items))
				.map_err(|source| (category, source))
		});
		let mut failures = Vec::new();
		let collected = match self.failure_policy {
			FailurePolicy::FailFast => future::try_join_all(drains)
				.await
				.map_err(|(category, source)| AggregateError::Category { category, source })?,
			FailurePolicy::Partial => {
				let mut collected = Vec::new();
				let mut first_error = None;

				for outcome in future::join_all(drains).await {
					match outcome {
						Ok(entry) => collected.push(entry),
						Err((category, source)) => {
							failures.push(CategoryFailure {
								category,
								kind: source.kind(),
								message: source.to_string(),
							});
							first_error
								.get_or_insert(AggregateError::Category { category, source });
						},
					}
				}

				if let Some(err) = first_error.filter(|_| collected.is_empty()) {
					return Err(err);
				}

				collected
			},
		};

		Ok(Aggregate { result: AggregateResult::project(request.projection, collected), failures })
	}
}
