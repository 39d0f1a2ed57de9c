#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use engagement_harvest::{
	auth::{AuthorizationExchange, Credential, CredentialHolder, TokenSecret},
	config::HarvestConfig,
	error::Error,
	http::ReqwestHttpClient,
	oauth::OAuth2RefreshExchange,
	url::Url,
};

fn exchange(server: &MockServer, secret: Option<&str>) -> OAuth2RefreshExchange {
	let endpoint = Url::parse(&server.url("/2/oauth2/token")).expect("Token URL should parse.");
	let http_client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(5))
		.expect("HTTP client should build.");

	OAuth2RefreshExchange::new(&endpoint, "client-harvest", secret, http_client)
		.expect("Exchange should build.")
}

#[tokio::test]
async fn refresh_grant_rotates_tokens() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"token_type":"bearer","expires_in":7200,"access_token":"access-new","refresh_token":"refresh-new","scope":"tweet.read users.read offline.access"}"#,
			);
		})
		.await;
	let tokens = exchange(&server, Some("secret-harvest"))
		.exchange(&TokenSecret::new("refresh-0"))
		.await
		.expect("Refresh grant should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(tokens.access_token.expose(), "access-new");
	assert_eq!(tokens.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-new"));
	assert_eq!(tokens.expires_in.map(|ttl| ttl.whole_seconds()), Some(7200));
}

#[tokio::test]
async fn invalid_grant_is_credential_unavailable() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/oauth2/token");
			then.status(400).header("content-type", "application/json").body(
				r#"{"error":"invalid_request","error_description":"Value passed for the token was invalid."}"#,
			);
		})
		.await;
	let err = exchange(&server, None)
		.exchange(&TokenSecret::new("revoked"))
		.await
		.expect_err("Rejected refresh token must fail.");

	mock.assert_calls_async(1).await;

	match err {
		Error::CredentialUnavailable { reason } => {
			assert!(reason.contains("invalid_request"), "unexpected reason: {reason}");
			assert!(reason.contains("HTTP 400"), "unexpected reason: {reason}");
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn holder_keeps_refresh_token_when_none_is_returned() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"token_type":"bearer","access_token":"access-1"}"#);
		})
		.await;
	let config = HarvestConfig::default()
		.with_token_endpoint(Url::parse(&server.url("/2/oauth2/token")).expect("URL should parse."))
		.with_client("client-harvest", None);
	let http_client = ReqwestHttpClient::with_timeout(config.http_timeout())
		.expect("HTTP client should build.");
	let exchange = OAuth2RefreshExchange::from_config(&config, http_client)
		.expect("Exchange should build.")
		.expect("Client id is configured.");
	let holder = CredentialHolder::new(
		Credential::new("access-0").with_refresh_token("refresh-0"),
		std::sync::Arc::new(exchange),
	);
	let refreshed = holder.refresh().await.expect("Refresh should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(refreshed.access_token.expose(), "access-1");
	assert_eq!(refreshed.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-0"));
	assert_eq!(holder.current().generation, 1);
}
