#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use engagement_harvest::{
	auth::TokenSecret,
	error::{Error, MalformedError, TransportError},
	http::ReqwestHttpClient,
	model::{Category, PageRequest},
	transport::{ReqwestTransport, ResourceTransport},
	url::Url,
};

fn transport(server: &MockServer) -> ReqwestTransport {
	let http_client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(5))
		.expect("HTTP client should build.");
	let api_base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");

	ReqwestTransport::new(http_client, api_base)
}

fn request(cursor: Option<&str>) -> PageRequest {
	PageRequest { resource_id: "42".into(), cursor: cursor.map(Into::into), page_size: 100 }
}

#[tokio::test]
async fn likers_page_presents_bearer_and_parses_cursor() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/2/tweets/42/liking_users")
				.header("authorization", "Bearer access-0")
				.query_param("max_results", "100");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"id":"1","name":"Alice","username":"alice"},{"id":"2","name":"Bob","username":"bob"}],"meta":{"result_count":2,"next_token":"c1"}}"#,
			);
		})
		.await;
	let page = transport(&server)
		.fetch_page(Category::Likes, &request(None), &TokenSecret::new("access-0"))
		.await
		.expect("Likers page should parse.");

	mock.assert_calls_async(1).await;

	assert_eq!(page.next_cursor.as_deref(), Some("c1"));
	assert_eq!(
		page.items.iter().map(|item| item.username.as_deref()).collect::<Vec<_>>(),
		[Some("alice"), Some("bob")]
	);
}

#[tokio::test]
async fn retweeters_follow_pagination_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/2/tweets/42/retweeted_by")
				.query_param("pagination_token", "c1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":[{"id":"3","name":"Carol","username":"carol"}],"meta":{"result_count":1}}"#);
		})
		.await;
	let page = transport(&server)
		.fetch_page(Category::Retweets, &request(Some("c1")), &TokenSecret::new("access-0"))
		.await
		.expect("Retweeters page should parse.");

	mock.assert_calls_async(1).await;

	assert_eq!(page.items.len(), 1);
	assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn replies_search_by_conversation_with_expansions() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/2/tweets/search/recent")
				.query_param("query", "conversation_id:42")
				.query_param("expansions", "author_id")
				.query_param("next_token", "n1");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"id":"900","author_id":"7","created_at":"2024-05-01T12:00:00.000Z","text":"me!"}],"includes":{"users":[{"id":"7","name":"Dan","username":"dan"}]},"meta":{"result_count":1,"next_token":"n2"}}"#,
			);
		})
		.await;
	let page = transport(&server)
		.fetch_page(Category::Replies, &request(Some("n1")), &TokenSecret::new("access-0"))
		.await
		.expect("Search page should parse.");

	mock.assert_calls_async(1).await;

	assert_eq!(page.items[0].user_id, "7");
	assert_eq!(page.users[0].username, "dan");
	assert_eq!(page.next_cursor.as_deref(), Some("n2"));
}

#[tokio::test]
async fn statuses_are_classified() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/2/tweets/1/liking_users");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"title":"Unauthorized","status":401}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/2/tweets/2/liking_users");
			then.status(429).header("retry-after", "15").body("Too Many Requests");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/2/tweets/3/liking_users");
			then.status(503).body("Over capacity");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/2/tweets/4/liking_users");
			then.status(200).header("content-type", "text/html").body("<html>oops</html>");
		})
		.await;

	let transport = transport(&server);
	let bearer = TokenSecret::new("access-0");
	let fetch = |id: &str| {
		let request = PageRequest { resource_id: id.into(), cursor: None, page_size: 100 };
		let transport = transport.clone();
		let bearer = bearer.clone();

		async move { transport.fetch_page(Category::Likes, &request, &bearer).await }
	};

	assert!(matches!(fetch("1").await, Err(Error::Unauthenticated)));
	assert!(matches!(
		fetch("2").await,
		Err(Error::RateLimited { retry_after: Some(delay) }) if delay.whole_seconds() == 15
	));
	assert!(matches!(
		fetch("3").await,
		Err(Error::Unavailable(TransportError::Status { status: 503, ref message }))
			if message == "Over capacity"
	));
	assert!(matches!(fetch("4").await, Err(Error::Malformed(MalformedError::Json { .. }))));
}

#[tokio::test]
async fn unreachable_host_is_unavailable() {
	let http_client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(2))
		.expect("HTTP client should build.");
	let transport = ReqwestTransport::new(
		http_client,
		Url::parse("http://127.0.0.1:9/").expect("Fixture URL should parse."),
	);
	let err = transport
		.fetch_page(Category::Likes, &request(None), &TokenSecret::new("access-0"))
		.await
		.expect_err("Closed port must fail.");

	assert!(matches!(err, Error::Unavailable(TransportError::Network { .. })));
}
