use super::stats::TaskStatistics;
use embedded_time::duration::Microseconds;

/// Number of entries in the task registry.
pub const TASK_COUNT: usize = 12;

/// Stable identifier of a task, also its index in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    System,
    Gyro,
    Filter,
    Pid,
    Accel,
    Attitude,
    Rx,
    Serial,
    Dispatch,
    BatteryVoltage,
    Beeper,
    Telemetry,
}

impl TaskId {
    /// Every task identifier in registry order.
    pub const ALL: [TaskId; TASK_COUNT] = [
        TaskId::System,
        TaskId::Gyro,
        TaskId::Filter,
        TaskId::Pid,
        TaskId::Accel,
        TaskId::Attitude,
        TaskId::Rx,
        TaskId::Serial,
        TaskId::Dispatch,
        TaskId::BatteryVoltage,
        TaskId::Beeper,
        TaskId::Telemetry,
    ];

    /// The registry index of this task.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for the tasks driven by the gyro fast path.
    pub const fn is_gyro_chain(self) -> bool {
        matches!(self, TaskId::Gyro | TaskId::Filter | TaskId::Pid)
    }
}

/// Static priority of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    Idle = 0,
    Low = 1,
    Medium = 3,
    MediumHigh = 4,
    High = 5,
    Realtime = 6,
}

impl Priority {
    pub const fn ordinal(self) -> u16 {
        self as u16
    }
}

/// An event containing the current time and state for a task.
pub struct Event<'a, T> {
    /// The state of the system running the scheduler.
    pub state: &'a mut T,

    /// The time the scheduler pass started.
    pub now: Microseconds<u32>,
}

/// The body of a task.
pub type TaskFn<T> = fn(Event<'_, T>);

/// Readiness check of an event driven task.
///
/// Called with the system state, the current time and the time since the
/// task last ran (both in microseconds).
pub type CheckFn<T> = fn(&mut T, u32, u32) -> bool;

/// Convert a rate in hz to a period in microseconds.
pub const fn period_hz(hz: u32) -> u32 {
    1_000_000 / hz
}

/// A task in the registry
pub struct Task<T> {
    /// The registry slot of this task.
    pub id: TaskId,

    /// Name used in diagnostics.
    pub name: &'static str,

    /// The function to run, `None` if this firmware build has no body for the task.
    pub(crate) run: Option<TaskFn<T>>,

    /// Makes the task event driven rather than purely period driven.
    pub check_ready: Option<CheckFn<T>>,

    /// The desired time (in microseconds) between runs.
    pub desired_period: u32,

    pub static_priority: Priority,

    /// Zero when the task is not waiting to be selected.
    pub dynamic_priority: u16,

    /// Consecutive passes this task has waited while eligible.
    pub age_cycles: u32,

    /// The time (in microseconds) the task last ran.
    pub last_executed_at: u32,

    /// The time the readiness check of an event driven task last returned true.
    pub last_signaled_at: u32,

    /// The ideal time of the last run, used when optimizing the gyro rate.
    pub last_desired_at: u32,

    /// The time between the two most recent runs.
    pub latest_delta_time: u32,

    pub stats: TaskStatistics,

    pub(crate) enabled: bool,
}

impl<T> Task<T> {
    /// Create a new task from the function to run.
    pub fn new(id: TaskId, name: &'static str, run: TaskFn<T>) -> Self {
        Self {
            run: Some(run),
            ..Self::unassigned(id)
        }
        .with_name(name)
    }

    /// Create a registry entry without a body. It can never be enabled.
    pub fn unassigned(id: TaskId) -> Self {
        Self {
            id,
            name: "",
            run: None,
            check_ready: None,
            desired_period: 0,
            static_priority: Priority::Idle,
            dynamic_priority: 0,
            age_cycles: 0,
            last_executed_at: 0,
            last_signaled_at: 0,
            last_desired_at: 0,
            latest_delta_time: 0,
            stats: TaskStatistics::default(),
            enabled: false,
        }
        .with_name(id_name(id))
    }

    /// Builder method to set `name` and return `self`
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Builder method to set `desired_period` from a rate in hz and return `self`
    pub fn with_hz(self, hz: u32) -> Self {
        self.with_period(period_hz(hz))
    }

    /// Builder method to set `desired_period` (in microseconds) and return `self`
    pub fn with_period(mut self, micros: u32) -> Self {
        self.desired_period = micros;
        self
    }

    /// Builder method to set `static_priority` and return `self`
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.static_priority = priority;
        self
    }

    /// Builder method to set `check_ready` and return `self`
    pub fn with_check(mut self, check: CheckFn<T>) -> Self {
        self.check_ready = Some(check);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true if the task has a body and so can be enabled.
    pub fn has_body(&self) -> bool {
        self.run.is_some()
    }

    /// The priority this task is ordered by when added to the queue.
    pub fn queue_priority(&self) -> u16 {
        if self.dynamic_priority > 0 {
            self.dynamic_priority
        } else {
            self.static_priority.ordinal()
        }
    }

    /// Returns true if the desired period has elapsed since the last run.
    pub fn is_due(&self, now: u32) -> bool {
        cmp_time_us(now, self.last_executed_at) >= self.desired_period as i32
    }
}

fn id_name(id: TaskId) -> &'static str {
    match id {
        TaskId::System => "SYSTEM",
        TaskId::Gyro => "GYRO",
        TaskId::Filter => "FILTER",
        TaskId::Pid => "PID",
        TaskId::Accel => "ACCEL",
        TaskId::Attitude => "ATTITUDE",
        TaskId::Rx => "RX",
        TaskId::Serial => "SERIAL",
        TaskId::Dispatch => "DISPATCH",
        TaskId::BatteryVoltage => "BATTERY_VOLTAGE",
        TaskId::Beeper => "BEEPER",
        TaskId::Telemetry => "TELEMETRY",
    }
}

/// Signed difference `a - b` between two microsecond timestamps.
pub fn cmp_time_us(a: u32, b: u32) -> i32 {
    a.wrapping_sub(b) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: Event<'_, ()>) {}

    #[test]
    fn registry_order_matches_index() {
        for (index, id) in TaskId::ALL.iter().enumerate() {
            assert_eq!(id.index(), index);
        }
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Idle < Priority::Low);
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::MediumHigh);
        assert!(Priority::MediumHigh < Priority::High);
        assert!(Priority::High < Priority::Realtime);
    }

    #[test]
    fn builder() {
        let task = Task::new(TaskId::Accel, "ACCEL", noop)
            .with_hz(1000)
            .with_priority(Priority::Medium);

        assert_eq!(task.desired_period, 1000);
        assert_eq!(task.queue_priority(), Priority::Medium.ordinal());
        assert!(task.has_body());
        assert!(!task.is_enabled());
    }

    #[test]
    fn keeps_given_name() {
        let task = Task::new(TaskId::Accel, "ACC_1KHZ", noop);
        assert_eq!(task.name, "ACC_1KHZ");
        assert_eq!(task.id, TaskId::Accel);
    }

    #[test]
    fn unassigned_task_has_no_body() {
        let task: Task<()> = Task::unassigned(TaskId::Telemetry);
        assert!(!task.has_body());
        assert_eq!(task.name, "TELEMETRY");
    }

    #[test]
    fn due_after_period() {
        let mut task = Task::new(TaskId::Accel, "ACCEL", noop).with_period(1000);
        task.last_executed_at = 4000;

        assert!(!task.is_due(4999));
        assert!(task.is_due(5000));
        // A run stamped in the future is never due
        assert!(!task.is_due(3000));
    }

    #[test]
    fn time_difference_wraps() {
        assert_eq!(cmp_time_us(5, u32::MAX - 4), 10);
        assert_eq!(cmp_time_us(100, 150), -50);
    }
}
