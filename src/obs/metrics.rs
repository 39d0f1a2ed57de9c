// self
use crate::obs::{OpKind, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"engagement_harvest_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how many items a category drain produced (when enabled).
pub fn record_items(stage: &'static str, count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("engagement_harvest_items_total", "stage" => stage)
			.increment(count as u64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, count);
	}
}
