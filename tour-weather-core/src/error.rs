use thiserror::Error;

/// Why a single retrieval step produced no data.
///
/// None of these reach the caller of the aggregator; they are logged and the
/// step degrades to "no data".
#[derive(Debug, Error)]
pub enum StepError {
    #[error("request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("unexpected payload: {0:#}")]
    Payload(anyhow::Error),

    #[error("provider returned no samples for {0}")]
    EmptyPage(i64),

    #[error("daily request budget is exhausted")]
    BudgetExhausted,

    #[error("no data can exist yet for {0}")]
    FutureTime(i64),
}
