//! Execution time statistics
//!
//! Each task keeps a moving sum over [`TASK_STATS_MOVING_SUM_COUNT`] samples of
//! its execution time. The moving sum divided by the sample count is the
//! estimated time of the next run, used to keep lower priority tasks clear of
//! the next gyro deadline.

use super::task::{Priority, Task};

/// Number of samples in the moving sum of execution times.
pub const TASK_STATS_MOVING_SUM_COUNT: u32 = 32;

/// Running measurement of a single duration (task body or readiness check).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionTime {
    pub total: u32,
    pub max: u32,
    pub moving_sum: u32,
}

impl ExecutionTime {
    /// Add a measured duration (in microseconds).
    pub fn record(&mut self, duration: u32) {
        self.moving_sum = self
            .moving_sum
            .saturating_add(duration)
            .saturating_sub(self.moving_sum / TASK_STATS_MOVING_SUM_COUNT);
        self.total = self.total.saturating_add(duration);
        self.max = self.max.max(duration);
    }

    /// The estimated duration of the next measurement.
    pub fn average(&self) -> u32 {
        self.moving_sum / TASK_STATS_MOVING_SUM_COUNT
    }

    /// Seed the moving sum so that [`average`](Self::average) reports `micros`.
    pub fn set_average(&mut self, micros: u32) {
        self.moving_sum = micros.saturating_mul(TASK_STATS_MOVING_SUM_COUNT);
    }
}

/// Statistics of a task and its readiness check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskStatistics {
    pub execution: ExecutionTime,
    pub check: ExecutionTime,
}

impl TaskStatistics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read only view of a task for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: &'static str,
    pub is_enabled: bool,
    pub desired_period: u32,
    pub static_priority: Priority,
    pub max_execution_time: u32,
    pub total_execution_time: u32,
    pub average_execution_time: u32,
    pub latest_delta_time: u32,
}

impl<T> From<&Task<T>> for TaskInfo {
    fn from(task: &Task<T>) -> Self {
        Self {
            name: task.name,
            is_enabled: task.is_enabled(),
            desired_period: task.desired_period,
            static_priority: task.static_priority,
            max_execution_time: task.stats.execution.max,
            total_execution_time: task.stats.execution.total,
            average_execution_time: task.stats.execution.average(),
            latest_delta_time: task.latest_delta_time,
        }
    }
}

/// Statistics of the readiness checks of event driven tasks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckFuncInfo {
    pub max_execution_time: u32,
    pub total_execution_time: u32,
    pub average_execution_time: u32,
}

impl From<&ExecutionTime> for CheckFuncInfo {
    fn from(check: &ExecutionTime) -> Self {
        Self {
            max_execution_time: check.max,
            total_execution_time: check.total,
            average_execution_time: check.average(),
        }
    }
}

/// Average number of waiting tasks per pass, sampled by the system task.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLoad {
    total_waiting_tasks: u32,
    total_waiting_tasks_samples: u32,
    average_percent: u16,
}

impl SystemLoad {
    /// Accumulate the waiting task count of one pass.
    pub fn sample(&mut self, waiting_tasks: u16) {
        self.total_waiting_tasks = self.total_waiting_tasks.saturating_add(waiting_tasks as u32);
        self.total_waiting_tasks_samples = self.total_waiting_tasks_samples.saturating_add(1);
    }

    /// Fold the accumulated samples into the average and start a new window.
    pub fn update(&mut self) {
        if self.total_waiting_tasks_samples > 0 {
            let percent = 100 * self.total_waiting_tasks as u64
                / self.total_waiting_tasks_samples as u64;
            self.average_percent = percent.min(u16::MAX as u64) as u16;
            self.total_waiting_tasks = 0;
            self.total_waiting_tasks_samples = 0;
        }
    }

    pub fn average_percent(&self) -> u16 {
        self.average_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_sum_converges_to_duration() {
        let mut time = ExecutionTime::default();
        for _ in 0..1000 {
            time.record(40);
        }

        assert_eq!(time.total, 40_000);
        assert_eq!(time.max, 40);
        // The moving sum settles within one sample count of the true sum
        assert!(time.average() >= 38 && time.average() <= 40);
    }

    #[test]
    fn seeded_average() {
        let mut time = ExecutionTime::default();
        time.set_average(32);
        assert_eq!(time.average(), 32);

        time.record(32);
        assert_eq!(time.average(), 32);
    }

    #[test]
    fn max_tracks_largest_sample() {
        let mut time = ExecutionTime::default();
        time.record(10);
        time.record(90);
        time.record(20);

        assert_eq!(time.max, 90);
        assert_eq!(time.total, 120);
    }

    #[test]
    fn system_load_percent() {
        let mut load = SystemLoad::default();
        load.update();
        assert_eq!(load.average_percent(), 0);

        load.sample(1);
        load.sample(2);
        load.sample(0);
        load.sample(1);
        load.update();
        assert_eq!(load.average_percent(), 100);

        // The window restarts after each update
        load.sample(3);
        load.update();
        assert_eq!(load.average_percent(), 300);
    }
}
