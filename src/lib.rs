//! # flight-scheduler
//! A `#![no_std]` cooperative real-time scheduler for flight controller firmware
//!
//! # Tasks
//! [`TaskRegistry`] holds a fixed table of [`Task`]s, one per [`TaskId`],
//! each with a desired period and a static [`Priority`].
//! Enabled tasks are kept in the [`TaskQueue`](scheduler::TaskQueue).
//!
//! # Scheduling
//! [`Scheduler::run_once`] is one pass of the firmware main loop.
//! The gyro sample, filter and PID loop can run back to back from the
//! [`GyroFastPath`](scheduler::GyroFastPath) whenever the gyro is due.
//! Every other task is picked by dynamic priority, which grows each pass a task
//! waits, and is only started if it is expected to finish before the next gyro sample.
//!
//! ```
//! use flight_scheduler::{Event, Priority, Task, TaskId, TaskRegistry};
//!
//! fn update_accel(event: Event<'_, u32>) {
//!     *event.state += 1;
//! }
//!
//! let registry = TaskRegistry::from_tasks([
//!     Task::new(TaskId::Accel, "ACCEL", update_accel)
//!         .with_hz(1000)
//!         .with_priority(Priority::Medium),
//! ]);
//! assert_eq!(registry.get(TaskId::Accel).desired_period, 1000);
//! ```

#![cfg_attr(not(test), no_std)]

mod logging;

mod error;
pub use error::Error;

pub mod scheduler;
pub use scheduler::{
    Event, Pass, Priority, Scheduler, SchedulerConfig, Task, TaskId, TaskInfo, TaskRegistry,
};
