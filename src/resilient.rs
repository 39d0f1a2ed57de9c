//! Refresh-and-retry wrapper for calls authenticated by the held credential.
//!
//! An operation runs with the current credential snapshot. When it fails with
//! [`Error::Unauthenticated`], the wrapper asks the [`CredentialHolder`] to replace that
//! snapshot and runs the operation exactly once more. Every other failure passes through
//! untouched on the first attempt. The retry budget belongs to the [`AutoRefresh`] value, so
//! a paginator can share one budget across all pages of a drain.

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialHolder},
};

/// Refresh-and-retry state with a budget of one refresh.
#[derive(Debug)]
pub struct AutoRefresh<'a> {
	holder: &'a CredentialHolder,
	refreshed: bool,
}
impl<'a> AutoRefresh<'a> {
	/// Upper bound on invocations of one operation.
	pub const MAX_ATTEMPTS: u32 = 2;

	/// Creates a wrapper with an unspent refresh budget.
	pub fn new(holder: &'a CredentialHolder) -> Self {
		Self { holder, refreshed: false }
	}

	/// Returns `true` once the refresh budget has been spent.
	pub fn refreshed(&self) -> bool {
		self.refreshed
	}

	/// Runs `operation`, refreshing and retrying once on [`Error::Unauthenticated`].
	///
	/// A second `Unauthenticated`, or any `Unauthenticated` after the budget was spent by an
	/// earlier call, is returned to the caller. A failed refresh surfaces as
	/// [`Error::CredentialUnavailable`].
	pub async fn run<T, F, Fut>(&mut self, mut operation: F) -> Result<T>
	where
		F: FnMut(Credential) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut credential = self.holder.current();
		let mut attempt = 1;

		loop {
			match operation(credential.clone()).await {
				Err(Error::Unauthenticated) if attempt < Self::MAX_ATTEMPTS && !self.refreshed => {
					self.refreshed = true;
					attempt += 1;
					credential = self.holder.refresh_stale(&credential).await?;
				},
				outcome => return outcome,
			}
		}
	}
}

/// Runs `operation` under a fresh [`AutoRefresh`] budget.
pub async fn with_auto_refresh<T, F, Fut>(holder: &CredentialHolder, operation: F) -> Result<T>
where
	F: FnMut(Credential) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	AutoRefresh::new(holder).run(operation).await
}
