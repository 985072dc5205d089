use tracing::info;

use crate::test::{TestResult, TestStatus};

/// Pass/fail tally over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub total: u32,
    pub success: u32,
    pub failure: u32,
    pub timeout: u32,
}

impl Summary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut s = Summary::default();
        for r in results {
            s.add(r.status);
        }
        s
    }

    pub fn add(&mut self, status: TestStatus) {
        self.total += 1;
        match status {
            TestStatus::Success => self.success += 1,
            TestStatus::Failure => self.failure += 1,
            TestStatus::Timeout => self.timeout += 1,
        }
    }

    /// Percentage of successful attempts, 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 * 100.0 / self.total as f64
    }

    pub fn log(&self) {
        info!(
            "total={} success={} failure={} timeout={} => {:.1}% success",
            self.total,
            self.success,
            self.failure,
            self.timeout,
            self.success_rate()
        );
    }
}
