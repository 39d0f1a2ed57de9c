//! Resilient paginated collection of the accounts that engaged with a post.
//!
//! The crate walks the likers, reposters, and reply threads of a single post through a
//! cursor-paginated remote API, survives bearer-token expiry with a single-flight refresh,
//! paces page requests, and folds the three resource categories into one projection that is
//! ready for "pick a random winner" style workflows.
//!
//! The moving parts, leaves first:
//!
//! - [`auth::CredentialHolder`] owns the bearer credential and serializes refreshes.
//! - [`transport::ResourceTransport`] performs one authenticated page call.
//! - [`paginate::Paginator`] drains every page of a category in cursor order.
//! - [`resilient::AutoRefresh`] retries a call once after refreshing the credential.
//! - [`aggregate::Aggregator`] runs the requested categories and shapes the result.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
#[cfg(feature = "reqwest")] pub mod oauth;
pub mod obs;
pub mod paginate;
pub mod resilient;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(not(feature = "reqwest"))] use oauth2 as _;
#[cfg(test)] use {color_eyre as _, httpmock as _};
