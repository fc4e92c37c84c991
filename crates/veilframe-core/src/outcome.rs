//! Three-way disjoint operation outcomes.
//!
//! Every stream operation is deadline-bounded and reports exactly one of
//! three outcomes: completed, timed out, or failed. Failure travels in the
//! surrounding `Result`; this type keeps the timeout case disjoint from
//! both success and error instead of folding it into the error taxonomy.

use std::future::Future;
use std::time::Duration;

/// Result of a deadline-bounded operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The operation finished before the deadline.
    Completed(T),
    /// The deadline elapsed first. The stream is not corrupted, but its
    /// logical state is unspecified; callers should not blindly retry.
    TimedOut,
}

impl<T> Outcome<T> {
    /// Whether the operation completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the deadline elapsed.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::TimedOut => None,
        }
    }

    /// Maps the completed value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Completed(value) => Outcome::Completed(f(value)),
            Self::TimedOut => Outcome::TimedOut,
        }
    }
}

/// Runs a fallible future under a deadline.
///
/// Flattens `tokio::time::timeout` into the three-way outcome: elapsing the
/// deadline yields `Ok(TimedOut)`, an inner error propagates as `Err`.
pub async fn bounded<T, E, F>(deadline: Duration, fut: F) -> Result<Outcome<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(Outcome::Completed(value)),
        Ok(Err(err)) => Err(err),
        Err(_elapsed) => Ok(Outcome::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_timeout() {
        let timed_out: Outcome<u32> = Outcome::TimedOut;
        assert!(timed_out.map(|v| v + 1).is_timed_out());

        assert_eq!(Outcome::Completed(1).map(|v| v + 1), Outcome::Completed(2));
    }

    #[tokio::test]
    async fn bounded_completes_fast_futures() {
        let outcome: Result<Outcome<u32>, std::io::Error> =
            bounded(Duration::from_secs(1), async { Ok(7) }).await;

        assert_eq!(outcome.ok().and_then(Outcome::completed), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_reports_timeout() {
        let outcome: Result<Outcome<()>, std::io::Error> =
            bounded(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(outcome.is_ok_and(|o| o.is_timed_out()));
    }

    #[tokio::test]
    async fn bounded_propagates_errors() {
        let outcome: Result<Outcome<()>, std::io::Error> =
            bounded(Duration::from_secs(1), async {
                Err(std::io::Error::other("sink failure"))
            })
            .await;

        assert!(outcome.is_err());
    }
}
