// self
use crate::{_prelude::*, obs::Stage};

/// Future returned by [`StageSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`StageSpan::instrument`]; the input future itself without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// Span covering one stage of a call; zero-sized without `tracing`.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Opens an `sdk_pipeline.stage` span for `stage`, entered from `call_site`.
	pub fn new(stage: Stage, call_site: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("sdk_pipeline.stage", stage = stage.as_str(), call_site);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, call_site);

			Self {}
		}
	}

	/// Runs `fut` inside this span each time it is polled.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// `tracing::warn!` that compiles away without the feature.
macro_rules! stage_warn {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::warn!($($arg)+);
		}
	};
}

/// `tracing::debug!` that compiles away without the feature.
macro_rules! stage_debug {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)+);
		}
	};
}

pub(crate) use {stage_debug, stage_warn};
