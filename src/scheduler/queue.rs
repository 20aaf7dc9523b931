use super::task::{TaskId, TASK_COUNT};
use heapless::Vec;

/// Slots backing the queue: one per task plus the empty terminator.
pub const TASK_QUEUE_CAPACITY: usize = TASK_COUNT + 1;

/// Enabled tasks ordered by priority at the time they were added.
///
/// Entries refer to registry slots by [`TaskId`]. At most [`TASK_COUNT`] slots
/// are ever occupied, so [`slot`](TaskQueue::slot) at `len()` and beyond is
/// always `None`.
#[derive(Debug, Default)]
pub struct TaskQueue {
    entries: Vec<TaskId, TASK_QUEUE_CAPACITY>,
    cursor: usize,
}

impl TaskQueue {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.contains(&id)
    }

    /// The entry at `index`, or `None` for an unoccupied slot.
    pub fn slot(&self, index: usize) -> Option<TaskId> {
        self.entries.get(index).copied()
    }

    /// Add a task ahead of the first entry with a strictly lower priority.
    ///
    /// `priority_of` reports the current priority of the entries already queued.
    /// Returns false if the task is already queued.
    pub fn add(&mut self, id: TaskId, priority: u16, priority_of: impl Fn(TaskId) -> u16) -> bool {
        if self.contains(id) {
            return false;
        }
        debug_assert!(self.entries.len() < TASK_COUNT, "task queue overflow");
        if self.entries.len() >= TASK_COUNT {
            crate::log_warn!("task queue full, dropping {}", id.index());
            return false;
        }

        let index = self
            .entries
            .iter()
            .position(|&queued| priority_of(queued) < priority)
            .unwrap_or(self.entries.len());

        self.entries.insert(index, id).is_ok()
    }

    /// Remove a task, keeping the order of the remaining entries.
    /// Returns false if the task was not queued.
    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.entries.iter().position(|&queued| queued == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Reset the cursor and return the first entry.
    pub fn first(&mut self) -> Option<TaskId> {
        self.cursor = 0;
        self.slot(0)
    }

    /// Advance the cursor and return the entry it lands on.
    ///
    /// The cursor stops at the end of the queue, so once exhausted this keeps
    /// returning `None`.
    pub fn next(&mut self) -> Option<TaskId> {
        self.cursor = (self.cursor + 1).min(self.entries.len());
        self.slot(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::Priority;

    fn static_priority(id: TaskId) -> u16 {
        match id {
            TaskId::System => Priority::MediumHigh,
            TaskId::Gyro | TaskId::Filter | TaskId::Pid => Priority::Realtime,
            TaskId::Accel | TaskId::Attitude | TaskId::BatteryVoltage => Priority::Medium,
            TaskId::Rx | TaskId::Dispatch => Priority::High,
            TaskId::Serial | TaskId::Telemetry => Priority::Low,
            TaskId::Beeper => Priority::Idle,
        }
        .ordinal()
    }

    fn add(queue: &mut TaskQueue, id: TaskId) -> bool {
        queue.add(id, static_priority(id), static_priority)
    }

    fn collect(queue: &mut TaskQueue) -> std::vec::Vec<TaskId> {
        let mut ids = std::vec::Vec::new();
        let mut entry = queue.first();
        while let Some(id) = entry {
            ids.push(id);
            entry = queue.next();
        }
        ids
    }

    #[test]
    fn empty_queue() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.first(), None);
        assert_eq!(queue.next(), None);
        for index in 0..=TASK_QUEUE_CAPACITY {
            assert_eq!(queue.slot(index), None);
        }
    }

    #[test]
    fn orders_by_priority() {
        let mut queue = TaskQueue::new();

        assert!(add(&mut queue, TaskId::System));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.first(), Some(TaskId::System));

        add(&mut queue, TaskId::Serial);
        assert_eq!(collect(&mut queue), [TaskId::System, TaskId::Serial]);
        assert_eq!(queue.next(), None);

        add(&mut queue, TaskId::BatteryVoltage);
        assert_eq!(
            collect(&mut queue),
            [TaskId::System, TaskId::BatteryVoltage, TaskId::Serial]
        );

        add(&mut queue, TaskId::Rx);
        assert_eq!(
            collect(&mut queue),
            [
                TaskId::Rx,
                TaskId::System,
                TaskId::BatteryVoltage,
                TaskId::Serial
            ]
        );

        assert!(queue.remove(TaskId::System));
        assert_eq!(
            collect(&mut queue),
            [TaskId::Rx, TaskId::BatteryVoltage, TaskId::Serial]
        );
        assert_eq!(queue.slot(3), None);
    }

    #[test]
    fn equal_priority_keeps_insertion_order() {
        let mut queue = TaskQueue::new();
        add(&mut queue, TaskId::Accel);
        add(&mut queue, TaskId::Attitude);
        add(&mut queue, TaskId::BatteryVoltage);

        assert_eq!(
            collect(&mut queue),
            [TaskId::Accel, TaskId::Attitude, TaskId::BatteryVoltage]
        );
    }

    #[test]
    fn fill_and_empty() {
        let mut queue = TaskQueue::new();

        for (count, &id) in TaskId::ALL.iter().enumerate() {
            assert!(add(&mut queue, id));
            assert_eq!(queue.len(), count + 1);
        }
        assert_eq!(queue.len(), TASK_COUNT);
        assert!(queue.slot(TASK_COUNT - 1).is_some());
        assert_eq!(queue.slot(TASK_COUNT), None);
        assert_eq!(queue.slot(TASK_COUNT + 1), None);

        for (count, &id) in TaskId::ALL.iter().enumerate() {
            assert!(queue.remove(id));
            assert_eq!(queue.len(), TASK_COUNT - count - 1);
            assert_eq!(queue.slot(TASK_COUNT - count - 1), None);
        }
        assert!(queue.is_empty());
        assert_eq!(queue.slot(0), None);
    }

    #[test]
    fn duplicate_and_missing() {
        let mut queue = TaskQueue::new();
        assert!(add(&mut queue, TaskId::Accel));
        assert!(!add(&mut queue, TaskId::Accel));
        assert_eq!(queue.len(), 1);

        assert!(!queue.remove(TaskId::Rx));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(TaskId::Accel));
    }

    #[test]
    fn cursor_stops_at_end() {
        let mut queue = TaskQueue::new();
        add(&mut queue, TaskId::Accel);

        assert_eq!(queue.first(), Some(TaskId::Accel));
        assert_eq!(queue.next(), None);
        assert_eq!(queue.next(), None);
        assert_eq!(queue.next(), None);
        assert_eq!(queue.first(), Some(TaskId::Accel));
    }
}
