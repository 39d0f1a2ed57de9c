//! Process-wide bearer credential with single-flight refresh.
//!
//! [`CredentialHolder`] is the only owner of the mutable credential. Readers take cheap
//! snapshots through [`CredentialHolder::current`]; writers go through
//! [`CredentialHolder::refresh`] (or [`CredentialHolder::refresh_stale`]), which acquires an
//! async guard so at most one authorization exchange is in flight. Callers that queued
//! behind an exchange reuse its outcome: they receive the rotated credential on success and
//! the same [`Error::CredentialUnavailable`] on failure, without issuing a second exchange.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationExchange, Credential, ExchangedTokens, TokenSecret},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Owns the bearer credential and serializes refreshes.
///
/// The exchange runs on its own runtime task that holds the refresh guard until the
/// outcome is installed. Dropping the caller that started it (deadline, disconnect, a
/// failing sibling drain) never loses a rotated refresh token.
pub struct CredentialHolder {
	slot: Arc<CredentialSlot>,
	exchange: Option<Arc<dyn AuthorizationExchange>>,
	refresh_guard: Arc<AsyncMutex<Option<String>>>,
	/// Counters for refresh attempts, exchanges, shared outcomes, and failures.
	pub metrics: RefreshMetrics,
}
impl CredentialHolder {
	/// Creates a holder that refreshes through the provided exchange.
	pub fn new(seed: Credential, exchange: Arc<dyn AuthorizationExchange>) -> Self {
		Self::build(seed, Some(exchange))
	}

	/// Creates a holder for a static bearer token; every refresh fails.
	pub fn without_refresh(seed: Credential) -> Self {
		Self::build(seed, None)
	}

	fn build(seed: Credential, exchange: Option<Arc<dyn AuthorizationExchange>>) -> Self {
		Self {
			slot: Arc::new(CredentialSlot {
				state: RwLock::new(seed),
				exchanges_completed: AtomicU64::new(0),
			}),
			exchange,
			refresh_guard: Arc::new(AsyncMutex::new(None)),
			metrics: RefreshMetrics::default(),
		}
	}

	/// Returns the active credential snapshot.
	pub fn current(&self) -> Credential {
		self.slot.state.read().clone()
	}

	/// Refreshes the credential that is current at call time.
	pub async fn refresh(&self) -> Result<Credential> {
		let stale = self.current();

		self.refresh_stale(&stale).await
	}

	/// Refreshes after `stale` was rejected by the remote API.
	///
	/// Returns the already-rotated credential without an exchange when another caller
	/// replaced `stale` first, and the queued outcome when an exchange finished while this
	/// caller waited for the guard.
	///
	/// Must be called from within a Tokio runtime; the exchange is spawned onto it.
	pub async fn refresh_stale(&self, stale: &Credential) -> Result<Credential> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "credential");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_attempt();

		let observed = self.slot.exchanges_completed.load(Ordering::Acquire);
		let result = span
			.instrument(async {
				let last_failure = self.refresh_guard.lock_arc().await;
				let current = self.current();

				if current.generation != stale.generation {
					self.metrics.record_shared();

					return Ok(current);
				}
				if self.slot.exchanges_completed.load(Ordering::Acquire) != observed {
					self.metrics.record_shared();

					return match &*last_failure {
						Some(reason) => Err(Error::credential_unavailable(reason)),
						None => Ok(current),
					};
				}

				let exchange = self.exchange.clone().ok_or_else(|| {
					Error::credential_unavailable("no authorization exchange is configured")
				})?;
				let refresh_token = current
					.refresh_token
					.clone()
					.ok_or_else(|| Error::credential_unavailable("no refresh token is held"))?;

				self.metrics.record_exchange();

				let task = tokio::spawn(self.slot.clone().run_exchange(
					exchange,
					refresh_token,
					current,
					last_failure,
				));

				task.await.map_err(|err| {
					Error::credential_unavailable(format_args!("refresh task aborted: {err}"))
				})?
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}
}
impl Debug for CredentialHolder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialHolder")
			.field("credential", &*self.slot.state.read())
			.field("exchange_configured", &self.exchange.is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Credential state shared with in-flight exchange tasks.
struct CredentialSlot {
	state: RwLock<Credential>,
	exchanges_completed: AtomicU64,
}
impl CredentialSlot {
	/// Runs one exchange and installs its outcome; the guard is released only afterwards.
	async fn run_exchange(
		self: Arc<Self>,
		exchange: Arc<dyn AuthorizationExchange>,
		refresh_token: TokenSecret,
		current: Credential,
		mut last_failure: MutexGuardArc<Option<String>>,
	) -> Result<Credential> {
		let outcome = exchange.exchange(&refresh_token).await;
		let outcome = self.install(&current, outcome, &mut last_failure);

		self.exchanges_completed.fetch_add(1, Ordering::AcqRel);

		outcome
	}

	fn install(
		&self,
		current: &Credential,
		outcome: Result<ExchangedTokens>,
		last_failure: &mut Option<String>,
	) -> Result<Credential> {
		match outcome {
			Ok(tokens) => {
				let next = current.rotate(tokens);

				*self.state.write() = next.clone();
				*last_failure = None;

				Ok(next)
			},
			Err(err) => {
				let err = match err {
					err @ Error::CredentialUnavailable { .. } => err,
					other => Error::credential_unavailable(other),
				};

				*last_failure = Some(match &err {
					Error::CredentialUnavailable { reason } => reason.clone(),
					other => other.to_string(),
				});

				Err(err)
			},
		}
	}
}
