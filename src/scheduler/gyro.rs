use super::{
    config::{SchedulerConfig, GYRO_TASK_GUARD_INTERVAL_US},
    execute,
    registry::TaskRegistry,
    task::{cmp_time_us, Task, TaskId},
};
use crate::Error;
use embedded_time::Clock;

/// Readiness predicate of a stage in the gyro chain.
pub type ReadyFn<T> = fn(&mut T) -> bool;

/// Drives the gyro sample, then the filter and PID loop when they report ready.
///
/// These three tasks run back to back in the pass the gyro sample is due,
/// outside the task queue.
pub struct GyroFastPath<T> {
    pub filter_ready: ReadyFn<T>,
    pub pid_ready: ReadyFn<T>,
}

fn never_ready<T>(_: &mut T) -> bool {
    false
}

impl<T> Default for GyroFastPath<T> {
    fn default() -> Self {
        Self::new(never_ready, never_ready)
    }
}

impl<T> GyroFastPath<T> {
    pub fn new(filter_ready: ReadyFn<T>, pid_ready: ReadyFn<T>) -> Self {
        Self {
            filter_ready,
            pid_ready,
        }
    }

    /// Time (in microseconds) until the next gyro sample is due.
    ///
    /// Negative once the sample is overdue.
    pub fn time_to_next(gyro: &Task<T>, now: u32, optimize_rate: bool) -> i32 {
        let basis = if optimize_rate {
            gyro.last_desired_at
        } else {
            gyro.last_executed_at
        };
        gyro.desired_period as i32 - cmp_time_us(now, basis)
    }

    /// Returns true if a task expected to take `required_time` can start now
    /// without delaying the next gyro sample.
    pub fn admits(gyro: &Task<T>, now: u32, required_time: u32, optimize_rate: bool) -> bool {
        let time_to_next = Self::time_to_next(gyro, now, optimize_rate);
        time_to_next > GYRO_TASK_GUARD_INTERVAL_US as i32 && time_to_next > required_time as i32
    }

    /// Run the chain if the gyro sample is due.
    ///
    /// Returns the combined execution time of the chain, or `None` if the
    /// gyro was not due this pass.
    pub fn run<C>(
        &self,
        registry: &mut TaskRegistry<T>,
        clock: &C,
        system: &mut T,
        now: u32,
        config: &SchedulerConfig,
    ) -> Result<Option<u32>, Error>
    where
        C: Clock<T = u32>,
    {
        let gyro = registry.get(TaskId::Gyro);
        if !gyro.is_enabled() || Self::time_to_next(gyro, now, config.optimize_rate) > 0 {
            return Ok(None);
        }

        let statistics = config.calculate_task_statistics;
        let gyro = registry.get_mut(TaskId::Gyro);
        let desired_at = if config.optimize_rate {
            next_desired_at(gyro, now)
        } else {
            now
        };
        gyro.last_desired_at = desired_at;
        let mut execution_time = execute(clock, gyro, system, now, statistics)?;

        if (self.filter_ready)(system) {
            execution_time += run_stage(registry, TaskId::Filter, clock, system, now, statistics)?;
        }
        if (self.pid_ready)(system) {
            execution_time += run_stage(registry, TaskId::Pid, clock, system, now, statistics)?;
        }

        Ok(Some(execution_time))
    }
}

/// Advance the ideal gyro deadline by one period, resynchronizing to `now`
/// once it falls more than a full period behind.
fn next_desired_at<T>(gyro: &Task<T>, now: u32) -> u32 {
    let next = gyro.last_desired_at.wrapping_add(gyro.desired_period);
    if cmp_time_us(now, next) >= gyro.desired_period as i32 {
        now
    } else {
        next
    }
}

fn run_stage<C, T>(
    registry: &mut TaskRegistry<T>,
    id: TaskId,
    clock: &C,
    system: &mut T,
    now: u32,
    statistics: bool,
) -> Result<u32, Error>
where
    C: Clock<T = u32>,
{
    let task = registry.get_mut(id);
    if !task.is_enabled() {
        return Ok(0);
    }
    execute(clock, task, system, now, statistics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::{period_hz, Event, Priority};

    fn noop(_: Event<'_, ()>) {}

    fn gyro(last_executed_at: u32) -> Task<()> {
        let mut gyro = Task::new(TaskId::Gyro, "GYRO", noop)
            .with_hz(8000)
            .with_priority(Priority::Realtime);
        gyro.last_executed_at = last_executed_at;
        gyro.last_desired_at = last_executed_at;
        gyro
    }

    #[test]
    fn time_to_next_sample() {
        let gyro = gyro(4000);
        assert_eq!(GyroFastPath::time_to_next(&gyro, 4000, false), 125);
        assert_eq!(GyroFastPath::time_to_next(&gyro, 4100, false), 25);
        assert_eq!(GyroFastPath::time_to_next(&gyro, 4130, false), -5);
    }

    #[test]
    fn guard_interval() {
        let now = 4000;
        let gyro = gyro(now - period_hz(8000) + GYRO_TASK_GUARD_INTERVAL_US / 2);
        assert!(!GyroFastPath::admits(&gyro, now, 0, false));

        let gyro = self::gyro(now);
        assert!(GyroFastPath::admits(&gyro, now, 32, false));
    }

    #[test]
    fn guard_required_time() {
        let now = 4000;
        let gyro = gyro(now - period_hz(8000) + 16);
        assert!(GyroFastPath::admits(&gyro, now, 0, false));
        assert!(!GyroFastPath::admits(&gyro, now, 32, false));
    }

    #[test]
    fn desired_deadline_advances_by_period() {
        let mut gyro = gyro(4000);
        assert_eq!(next_desired_at(&gyro, 4130), 4125);

        // Too far behind, catch up to now
        gyro.last_desired_at = 3000;
        assert_eq!(next_desired_at(&gyro, 4130), 4130);
    }
}
