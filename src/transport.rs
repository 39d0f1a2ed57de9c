//! Single authenticated page call against one of the three resource endpoints.
//!
//! [`ResourceTransport`] is the harvester's only dependency on the remote API. It performs
//! one call, classifies the outcome, and keeps no state between calls: authentication
//! failures, rate limiting, network failures, and unexpected shapes all come back as
//! distinct [`Error`] variants so the retry wrapper and the aggregator can react to each
//! one separately.

pub(crate) mod wire;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TransportError,
	model::{Category, Page, PageRequest},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::HarvestConfig,
	error::ConfigError,
	http::{self, ReqwestHttpClient},
	obs::{OpKind, OpSpan},
};

/// Boxed future returned by [`ResourceTransport::fetch_page`].
pub type PageFuture<'a> = Pin<Box<dyn Future<Output = Result<Page>> + 'a + Send>>;

/// Performs one authenticated page call.
pub trait ResourceTransport
where
	Self: Send + Sync,
{
	/// Fetches one page of `category` for the request, presenting `bearer`.
	///
	/// # Errors
	///
	/// - [`Error::Unauthenticated`] when the bearer credential is rejected.
	/// - [`Error::RateLimited`] when the request quota is exhausted.
	/// - [`Error::Unavailable`] on network failures or unexpected statuses.
	/// - [`Error::Malformed`] when the response body has an unexpected shape.
	fn fetch_page<'a>(
		&'a self,
		category: Category,
		request: &'a PageRequest,
		bearer: &'a TokenSecret,
	) -> PageFuture<'a>;
}

/// Classifies a raw response into a [`Page`] or an [`Error`].
pub fn classify_response(
	category: Category,
	status: u16,
	retry_after: Option<Duration>,
	body: &[u8],
) -> Result<Page> {
	match status {
		200..=299 => wire::parse_page(category, status, body),
		401 => Err(Error::Unauthenticated),
		429 => Err(Error::RateLimited { retry_after }),
		_ => Err(TransportError::Status { status, message: body_preview(body) }.into()),
	}
}

fn body_preview(body: &[u8]) -> String {
	const LIMIT: usize = 256;

	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(LIMIT) {
		Some((cut, _)) => format!("{}...", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}

/// Query parameters of a page call; the cursor parameter name differs per endpoint.
pub fn page_query(category: Category, request: &PageRequest) -> Vec<(&'static str, String)> {
	let page_size = category.clamp_page_size(request.page_size).to_string();
	let mut query = match category {
		Category::Likes | Category::Retweets => vec![("max_results", page_size)],
		Category::Replies => vec![
			("query", format!("conversation_id:{}", request.resource_id)),
			("max_results", page_size),
			("tweet.fields", "author_id,created_at,conversation_id".into()),
			("expansions", "author_id".into()),
			("user.fields", "username".into()),
		],
	};

	if let Some(cursor) = &request.cursor {
		let name = match category {
			Category::Likes | Category::Retweets => "pagination_token",
			Category::Replies => "next_token",
		};

		query.push((name, cursor.clone()));
	}

	query
}

/// Relative endpoint path for a category.
pub fn endpoint_path(category: Category, resource_id: &str) -> String {
	match category {
		Category::Likes => format!("2/tweets/{resource_id}/liking_users"),
		Category::Retweets => format!("2/tweets/{resource_id}/retweeted_by"),
		Category::Replies => "2/tweets/search/recent".into(),
	}
}

/// reqwest-backed [`ResourceTransport`] for the v2 API.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	http_client: ReqwestHttpClient,
	api_base: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Creates a transport rooted at `api_base`.
	pub fn new(http_client: ReqwestHttpClient, mut api_base: Url) -> Self {
		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		Self { http_client, api_base }
	}

	/// Creates a transport from [`HarvestConfig`], building its own HTTP client.
	pub fn from_config(config: &HarvestConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout())?;

		Ok(Self::new(http_client, config.api_base.clone()))
	}

	fn endpoint(&self, category: Category, resource_id: &str) -> Result<Url> {
		self.api_base
			.join(&endpoint_path(category, resource_id))
			.map_err(|err| ConfigError::from(err).into())
	}
}
#[cfg(feature = "reqwest")]
impl ResourceTransport for ReqwestTransport {
	fn fetch_page<'a>(
		&'a self,
		category: Category,
		request: &'a PageRequest,
		bearer: &'a TokenSecret,
	) -> PageFuture<'a> {
		let span = OpSpan::new(OpKind::Page, category.as_str());

		Box::pin(span.clone().instrument(async move {
			let url = self.endpoint(category, &request.resource_id)?;
			let response = self
				.http_client
				.as_ref()
				.get(url)
				.bearer_auth(bearer.expose())
				.query(&page_query(category, request))
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let retry_after = http::parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?;

			span.note(format_args!("HTTP {status}, {} bytes", body.len()));

			classify_response(category, status, retry_after, &body)
		}))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request(cursor: Option<&str>, page_size: u32) -> PageRequest {
		PageRequest { resource_id: "42".into(), cursor: cursor.map(Into::into), page_size }
	}

	#[test]
	fn statuses_map_onto_taxonomy() {
		assert!(matches!(
			classify_response(Category::Likes, 401, None, b"{}"),
			Err(Error::Unauthenticated)
		));
		assert!(matches!(
			classify_response(Category::Likes, 429, Some(Duration::seconds(9)), b""),
			Err(Error::RateLimited { retry_after: Some(delay) }) if delay == Duration::seconds(9)
		));
		assert!(matches!(
			classify_response(Category::Replies, 503, None, b"over capacity"),
			Err(Error::Unavailable(TransportError::Status { status: 503, .. }))
		));
	}

	#[test]
	fn body_preview_truncates_long_bodies() {
		let preview = body_preview("x".repeat(1_000).as_bytes());

		assert_eq!(preview.len(), 259);
		assert!(preview.ends_with("..."));
	}

	#[test]
	fn cursor_parameter_differs_per_endpoint() {
		let likes = page_query(Category::Likes, &request(Some("c1"), 100));
		let replies = page_query(Category::Replies, &request(Some("c2"), 5));

		assert!(likes.contains(&("pagination_token", "c1".into())));
		assert!(replies.contains(&("next_token", "c2".into())));
		assert!(replies.contains(&("query", "conversation_id:42".into())));
		assert!(replies.contains(&("max_results", "10".into())));
		assert!(!page_query(Category::Retweets, &request(None, 50))
			.iter()
			.any(|(name, _)| *name == "pagination_token"));
	}

	#[test]
	fn endpoint_paths_follow_v2_layout() {
		assert_eq!(endpoint_path(Category::Likes, "42"), "2/tweets/42/liking_users");
		assert_eq!(endpoint_path(Category::Retweets, "42"), "2/tweets/42/retweeted_by");
		assert_eq!(endpoint_path(Category::Replies, "42"), "2/tweets/search/recent");
	}
}
