// Bounded busy-wait polling. Callers decide whether a timeout is fatal.

use quick_error::quick_error;

#[cfg(test)]
#[path = "./wait_test.rs"]
mod wait_test;

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Timeout {
        Exhausted(iterations: u32) {
            display("condition not met after {} polls", iterations)
        }
    }
}

/// Polls `predicate` until it returns true, at most `max_iterations` times.
/// Returns the number of polls used.
pub fn wait_for<F>(mut predicate: F, max_iterations: u32) -> Result<u32, Timeout>
where
    F: FnMut() -> bool,
{
    for i in 0..max_iterations {
        if predicate() {
            return Ok(i + 1);
        }
    }
    Err(Timeout::Exhausted(max_iterations))
}
