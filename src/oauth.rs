//! `refresh_token` grant against the provider token endpoint, built on the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationExchange, ExchangeFuture, ExchangedTokens, TokenSecret},
	config::HarvestConfig,
	error::ConfigError,
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type RefreshClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// [`AuthorizationExchange`] that performs the OAuth 2.0 `refresh_token` grant.
///
/// Public clients (no secret) send `client_id` in the form body; confidential clients
/// authenticate with HTTP Basic.
pub struct OAuth2RefreshExchange {
	oauth_client: RefreshClient,
	http_client: ReqwestHttpClient,
}
impl OAuth2RefreshExchange {
	/// Creates an exchange for the given token endpoint and client credentials.
	pub fn new(
		token_endpoint: &Url,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_endpoint.to_string()).map_err(ConfigError::from)?;
		let mut oauth_client =
			BasicClient::new(ClientId::new(client_id.to_owned())).set_token_uri(token_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Creates an exchange from [`HarvestConfig`]; `None` when no client id is configured.
	pub fn from_config(
		config: &HarvestConfig,
		http_client: ReqwestHttpClient,
	) -> Result<Option<Self>> {
		let Some(client_id) = config.client_id.as_deref() else {
			return Ok(None);
		};

		let client_secret = config.client_secret.as_ref().map(TokenSecret::expose);

		Self::new(&config.token_endpoint, client_id, client_secret, http_client).map(Some)
	}
}
impl AuthorizationExchange for OAuth2RefreshExchange {
	fn exchange<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.instrumented(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err))?;
			let mut tokens = ExchangedTokens::new(response.access_token().secret().to_owned());

			if let Some(refresh) = response.refresh_token() {
				tokens = tokens.with_refresh_token(refresh.secret().to_owned());
			}
			if let Some(ttl) = response.expires_in().and_then(|ttl| Duration::try_from(ttl).ok())
			{
				tokens = tokens.with_expires_in(ttl);
			}

			Ok(tokens)
		})
	}
}
impl Debug for OAuth2RefreshExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2RefreshExchange")
			.field("client_id", self.oauth_client.client_id())
			.finish_non_exhaustive()
	}
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta
		.and_then(|value| value.status)
		.map(|status| format!(" (HTTP {status})"))
		.unwrap_or_default();

	match err {
		RequestTokenError::ServerResponse(response) =>
			Error::credential_unavailable(describe_server_error(&response, &status)),
		RequestTokenError::Request(error) => Error::credential_unavailable(format!(
			"token endpoint could not be reached{status}: {error}"
		)),
		RequestTokenError::Parse(error, _body) => Error::credential_unavailable(format!(
			"token endpoint returned malformed JSON{status} at `{}`",
			error.path()
		)),
		RequestTokenError::Other(message) => Error::credential_unavailable(format!(
			"token endpoint returned an unexpected response{status}: {message}"
		)),
	}
}

fn describe_server_error(response: &BasicErrorResponse, status: &str) -> String {
	match response.error_description() {
		Some(description) => format!(
			"token endpoint rejected the refresh token{status}: {} ({description})",
			response.error().as_ref()
		),
		None => format!(
			"token endpoint rejected the refresh token{status}: {}",
			response.error().as_ref()
		),
	}
}
