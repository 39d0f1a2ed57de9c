//! Optional observability helpers for page fetches, drains, refreshes, and aggregates.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `engagement_harvest.op` with the `op`
//!   (operation) and `stage` (category or call site) fields.
//! - Enable `metrics` to increment the `engagement_harvest_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the harvester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// One remote page call.
	Page,
	/// A full cursor drain of one category.
	Drain,
	/// A credential refresh.
	Refresh,
	/// An aggregate request spanning several categories.
	Aggregate,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Page => "page",
			OpKind::Drain => "drain",
			OpKind::Refresh => "refresh",
			OpKind::Aggregate => "aggregate",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
