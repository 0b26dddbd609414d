//! Fail-open helper for side effects
//!
//! Use this for follow-up actions on the source ticket (comments, labels,
//! assignment, status changes, snapshot files). Do NOT use it for issue
//! creation, which reports failures through outcomes instead.

use std::fmt::Display;

use tracing::warn;

/// Runs `f`, logging the error and returning `None` on failure
///
/// ```
/// use intake_cli::intake::fail_open;
///
/// let labelled = fail_open("add_label", || Err::<(), _>("tracker offline"));
/// assert!(labelled.is_none());
/// ```
pub fn fail_open<F, T, E>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    match f() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {:#}", operation_name, e);
            None
        }
    }
}
