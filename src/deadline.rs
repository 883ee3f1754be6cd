use std::time::{Duration, Instant};

/// Held back from the walk refiner for move matching and output
const SAFETY_RESERVE: Duration = Duration::from_millis(150);

/// Wall-clock budget for one turn
#[derive(Clone,Debug)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}
impl Deadline {
    pub fn start(budget_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn elapsed(&self) -> Duration { self.start.elapsed() }

    pub fn remaining(&self) -> Duration { self.budget.saturating_sub(self.elapsed()) }

    pub fn is_expired(&self) -> bool { self.remaining().is_zero() }

    /// Even split of what is left, after the reserve, among `num_tasks` remaining tasks
    pub fn share(&self, num_tasks: usize) -> Duration {
        let available = self.remaining().saturating_sub(SAFETY_RESERVE);
        available / num_tasks.max(1) as u32
    }
}
