//! Confirmation before mutating anything.

/// Asked once per run with the selection summary, before any mutation.
pub trait Confirm {
    fn confirm(&self, summary: &str) -> bool;
}

/// Accepts every selection. Used for forced runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _summary: &str) -> bool {
        true
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, summary: &str) -> bool {
        self(summary)
    }
}
