//! Cooperative task scheduler
//!
//! Each call to [`Scheduler::run_once`] is one pass of the firmware main loop.
//! In a pass the scheduler either runs the gyro chain through the
//! [`GyroFastPath`], or scans the [`TaskQueue`] and runs at most one task:
//! the eligible task with the highest dynamic priority, provided it can finish
//! before the next gyro sample is due.

use crate::Error;
use embedded_time::{duration::Microseconds, Clock};

mod config;
pub use config::{
    SchedulerConfig, GYRO_TASK_GUARD_INTERVAL_US, SCHEDULER_DELAY_LIMIT_US, TASK_AGE_BOOST_LIMIT,
};

mod gyro;
pub use gyro::{GyroFastPath, ReadyFn};

mod queue;
pub use queue::{TaskQueue, TASK_QUEUE_CAPACITY};

mod registry;
pub use registry::TaskRegistry;

mod stats;
pub use stats::{
    CheckFuncInfo, ExecutionTime, SystemLoad, TaskInfo, TaskStatistics,
    TASK_STATS_MOVING_SUM_COUNT,
};

mod task;
pub use task::{
    cmp_time_us, period_hz, CheckFn, Event, Priority, Task, TaskFn, TaskId, TASK_COUNT,
};


/// The outcome of one scheduler pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pass {
    /// The task picked by normal selection, `None` if no task passed selection.
    pub selected: Option<TaskId>,

    /// Dynamic priority the selected task won with.
    pub selected_dynamic_priority: u16,

    /// Number of tasks eligible to run this pass.
    pub waiting_tasks: u16,

    /// Estimated execution time of the selected task checked against the gyro guard.
    pub task_required_time: u32,

    /// Measured execution time of every task body run this pass.
    pub execution_time: u32,

    /// True if the gyro chain ran this pass.
    pub fast_path_ran: bool,
}

pub struct Scheduler<C, T> {
    clock: C,
    registry: TaskRegistry<T>,
    gyro: GyroFastPath<T>,
    config: SchedulerConfig,
    load: SystemLoad,
}

impl<C, T> Scheduler<C, T>
where
    C: Clock<T = u32>,
{
    pub fn new(clock: C, registry: TaskRegistry<T>) -> Self {
        Self {
            clock,
            registry,
            gyro: GyroFastPath::default(),
            config: SchedulerConfig::default(),
            load: SystemLoad::default(),
        }
    }

    /// Builder method to set the configuration and return `self`
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder method to set the readiness predicates of the gyro chain and return `self`
    pub fn with_gyro_chain(mut self, filter_ready: ReadyFn<T>, pid_ready: ReadyFn<T>) -> Self {
        self.gyro = GyroFastPath::new(filter_ready, pid_ready);
        self
    }

    /// Reset the queue to hold only the system task.
    pub fn init(&mut self) {
        self.registry.disable_all();
        self.registry.set_enabled(TaskId::System, true);
        crate::log_info!("scheduler initialised, {} task queued", self.registry.queue().len());
    }

    /// Run one pass of the scheduler.
    pub fn run_once(&mut self, system: &mut T) -> Result<Pass, Error> {
        let now = micros(&self.clock)?;
        let config = self.config;
        let mut pass = Pass::default();

        let gyro_guarded = config.gyro_fast_path && self.registry.get(TaskId::Gyro).is_enabled();
        if gyro_guarded {
            let chain = self
                .gyro
                .run(&mut self.registry, &self.clock, system, now, &config)?;
            if let Some(execution_time) = chain {
                pass.fast_path_ran = true;
                pass.execution_time = execution_time;
                if !config.run_after_fast_path {
                    return Ok(pass);
                }
            }
        }

        let mut selected = None;
        let mut selected_priority = 0;
        let mut cursor = self.registry.queue_mut().first();
        while let Some(id) = cursor {
            // The gyro chain is only ever run by the fast path
            if !(config.gyro_fast_path && id.is_gyro_chain()) {
                let task = self.registry.get_mut(id);
                if update_dynamic_priority(&self.clock, task, system, now, &config)? {
                    pass.waiting_tasks += 1;
                }
                if task.dynamic_priority > selected_priority {
                    selected_priority = task.dynamic_priority;
                    selected = Some(id);
                }
            }
            cursor = self.registry.queue_mut().next();
        }
        self.load.sample(pass.waiting_tasks);

        let Some(id) = selected else {
            return Ok(pass);
        };

        let task = self.registry.get(id);
        if config.calculate_task_statistics {
            pass.task_required_time = task.stats.execution.average();
        }

        // Right after the gyro chain ran there is a full period to spare
        if gyro_guarded && !pass.fast_path_ran {
            let gyro = self.registry.get(TaskId::Gyro);
            if !GyroFastPath::admits(gyro, now, pass.task_required_time, config.optimize_rate) {
                crate::log_trace!("{} deferred for the next gyro sample", task.name);
                return Ok(pass);
            }
        }

        let task = self.registry.get_mut(id);
        pass.selected = Some(id);
        pass.selected_dynamic_priority = task.dynamic_priority;
        pass.execution_time += execute(
            &self.clock,
            task,
            system,
            now,
            config.calculate_task_statistics,
        )?;

        if id == TaskId::System {
            self.load.update();
        }

        Ok(pass)
    }

    pub fn set_task_enabled(&mut self, id: TaskId, enabled: bool) {
        self.registry.set_enabled(id, enabled);
    }

    pub fn get_task_info(&self, id: TaskId) -> TaskInfo {
        TaskInfo::from(self.registry.get(id))
    }

    /// Statistics of the readiness check of an event driven task.
    pub fn get_check_func_info(&self, id: TaskId) -> CheckFuncInfo {
        CheckFuncInfo::from(&self.registry.get(id).stats.check)
    }

    /// The time between the two most recent runs of a task, zero while disabled.
    pub fn get_task_delta_time(&self, id: TaskId) -> u32 {
        let task = self.registry.get(id);
        if task.is_enabled() {
            task.latest_delta_time
        } else {
            0
        }
    }

    /// Change the desired period of a task, limited to [`SCHEDULER_DELAY_LIMIT_US`].
    pub fn reschedule_task(&mut self, id: TaskId, period: u32) {
        let task = self.registry.get_mut(id);
        if !task.has_body() {
            return;
        }
        task.desired_period = period.max(SCHEDULER_DELAY_LIMIT_US);
        crate::log_debug!("{} rescheduled to {} us", task.name, task.desired_period);
    }

    pub fn reset_task_statistics(&mut self, id: TaskId) {
        self.registry.get_mut(id).stats.reset();
    }

    pub fn reset_task_max_execution_time(&mut self, id: TaskId) {
        self.registry.get_mut(id).stats.execution.max = 0;
    }

    /// Average waiting tasks per pass (in percent) as of the last system task run.
    pub fn average_system_load_percent(&self) -> u16 {
        self.load.average_percent()
    }

    pub fn enable_gyro(&mut self) {
        self.config.gyro_fast_path = true;
        crate::log_info!("gyro fast path enabled");
    }

    pub fn disable_gyro(&mut self) {
        self.config.gyro_fast_path = false;
        crate::log_info!("gyro fast path disabled");
    }

    pub fn set_calculate_task_statistics(&mut self, enabled: bool) {
        self.config.calculate_task_statistics = enabled;
        crate::log_info!("task statistics: {}", enabled);
    }

    pub fn optimize_rate(&mut self, enabled: bool) {
        self.config.optimize_rate = enabled;
        crate::log_info!("optimize rate: {}", enabled);
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn task(&self, id: TaskId) -> &Task<T> {
        self.registry.get(id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> &mut Task<T> {
        self.registry.get_mut(id)
    }

    pub fn queue(&self) -> &TaskQueue {
        self.registry.queue()
    }
}

/// Decide if a task is eligible this pass and set its dynamic priority.
///
/// An event driven task stays eligible from the pass its check first returns
/// true until it runs, without being checked again. A period driven task is
/// eligible once its desired period has elapsed. Every pass an eligible task
/// spends waiting raises its priority by one, up to [`TASK_AGE_BOOST_LIMIT`].
fn update_dynamic_priority<C, T>(
    clock: &C,
    task: &mut Task<T>,
    system: &mut T,
    now: u32,
    config: &SchedulerConfig,
) -> Result<bool, Error>
where
    C: Clock<T = u32>,
{
    let waiting = task.dynamic_priority > 0;
    let eligible = match task.check_ready {
        Some(_) if waiting => true,
        Some(check) => {
            let since_last_run = now.wrapping_sub(task.last_executed_at);
            let ready = if config.calculate_task_statistics {
                let start = micros(clock)?;
                let ready = check(system, now, since_last_run);
                // A failed read loses the timing, never the signal
                if let Ok(end) = micros(clock) {
                    task.stats.check.record(end.wrapping_sub(start));
                }
                ready
            } else {
                check(system, now, since_last_run)
            };
            if ready {
                task.last_signaled_at = now;
            }
            ready
        }
        None => task.is_due(now),
    };

    if eligible {
        task.age_cycles = if waiting {
            task.age_cycles.saturating_add(1)
        } else {
            0
        };
        let boost = task.age_cycles.min(TASK_AGE_BOOST_LIMIT) as u16;
        task.dynamic_priority = 1 + task.static_priority.ordinal() + boost;
    } else {
        task.age_cycles = 0;
        task.dynamic_priority = 0;
    }

    Ok(eligible)
}

/// Run a task body and update its bookkeeping. Returns the measured
/// execution time, zero when statistics are off.
///
/// Nothing is touched if the start time cannot be read. A task without a body
/// is still marked as run so it leaves the candidates.
pub(crate) fn execute<C, T>(
    clock: &C,
    task: &mut Task<T>,
    system: &mut T,
    now: u32,
    calculate_statistics: bool,
) -> Result<u32, Error>
where
    C: Clock<T = u32>,
{
    let start = if calculate_statistics {
        Some(micros(clock)?)
    } else {
        None
    };

    task.latest_delta_time = now.wrapping_sub(task.last_executed_at);
    task.last_executed_at = now;
    task.dynamic_priority = 0;
    task.age_cycles = 0;

    let Some(run) = task.run else {
        return Ok(0);
    };
    run(Event {
        state: system,
        now: Microseconds(now),
    });

    let Some(start) = start else {
        return Ok(0);
    };
    let execution_time = micros(clock)?.wrapping_sub(start);
    task.stats.execution.record(execution_time);

    Ok(execution_time)
}

pub(crate) fn micros<C>(clock: &C) -> Result<u32, Error>
where
    C: Clock<T = u32>,
{
    let instant = clock.try_now()?;
    let micros: Microseconds<u32> = Microseconds::try_from(instant.duration_since_epoch())?;
    Ok(micros.0)
}
