/// Minimum time (in microseconds) left before the next gyro sample for any
/// other task to be started.
pub const GYRO_TASK_GUARD_INTERVAL_US: u32 = 10;

/// Shortest period (in microseconds) a task can be rescheduled to.
pub const SCHEDULER_DELAY_LIMIT_US: u32 = 10;

/// Upper bound of the priority boost a waiting task gains from its age.
pub const TASK_AGE_BOOST_LIMIT: u32 = 64;

/// Switches read by the scheduler at the start of each pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Run gyro, filter and PID from the fast path instead of the queue.
    pub gyro_fast_path: bool,

    /// Measure task execution times. When off, tasks run untimed and the
    /// gyro guard only enforces [`GYRO_TASK_GUARD_INTERVAL_US`].
    pub calculate_task_statistics: bool,

    /// Schedule the gyro against its ideal deadlines rather than the time it
    /// actually ran.
    pub optimize_rate: bool,

    /// Continue with normal selection in a pass where the fast path ran.
    pub run_after_fast_path: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            gyro_fast_path: false,
            calculate_task_statistics: true,
            optimize_rate: false,
            run_after_fast_path: false,
        }
    }
}

impl SchedulerConfig {
    /// Builder method to set `gyro_fast_path` and return `self`
    pub fn with_gyro_fast_path(mut self, enabled: bool) -> Self {
        self.gyro_fast_path = enabled;
        self
    }

    /// Builder method to set `calculate_task_statistics` and return `self`
    pub fn with_task_statistics(mut self, enabled: bool) -> Self {
        self.calculate_task_statistics = enabled;
        self
    }

    /// Builder method to set `optimize_rate` and return `self`
    pub fn with_optimize_rate(mut self, enabled: bool) -> Self {
        self.optimize_rate = enabled;
        self
    }

    /// Builder method to set `run_after_fast_path` and return `self`
    pub fn with_run_after_fast_path(mut self, enabled: bool) -> Self {
        self.run_after_fast_path = enabled;
        self
    }
}
