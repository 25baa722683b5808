// self
use crate::obs::{Stage, StageOutcome};

/// Increments `sdk_pipeline_stage_total{stage, outcome}`; does nothing without `metrics`.
pub fn record_stage_outcome(stage: Stage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"sdk_pipeline_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Maps `Ok` to [`StageOutcome::Success`] and `Err` to [`StageOutcome::Failure`].
pub fn record_stage_result<T, E>(stage: Stage, result: &Result<T, E>) {
	let outcome = if result.is_ok() { StageOutcome::Success } else { StageOutcome::Failure };

	record_stage_outcome(stage, outcome);
}
