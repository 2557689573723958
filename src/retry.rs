use std::future::Future;

/// Re-invokes a fallible operation until the predicate lets the result
/// through or the attempt budget is spent. The attempt counter lives inside
/// a single `run` call, so independent call sites never share retry state.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    max_attempts: u32,
}

impl Retry {
    /// Values below 1 are treated as 1; the config layer enforces the real
    /// [1, 10] range.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Runs `operation` with `input`, repeating while `should_retry` says so
    /// and attempts remain. Returns the last attempt's result; an accepted
    /// result short-circuits the loop.
    pub async fn run<In, Out, Op, Fut>(
        &self,
        input: In,
        mut operation: Op,
        should_retry: impl Fn(&Out) -> bool,
    ) -> Out
    where
        In: Clone,
        Op: FnMut(In) -> Fut,
        Fut: Future<Output = Out>,
    {
        let mut result = operation(input.clone()).await;
        let mut attempts = 1;
        while attempts < self.max_attempts && should_retry(&result) {
            result = operation(input.clone()).await;
            attempts += 1;
        }
        result
    }
}
