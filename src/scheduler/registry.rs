use super::{
    queue::TaskQueue,
    task::{Event, Priority, Task, TaskId, TASK_COUNT},
};

/// Fixed table of every task, indexed by [`TaskId`], and the queue of the
/// enabled ones.
///
/// A task is enabled exactly when it appears in the queue.
pub struct TaskRegistry<T> {
    tasks: [Task<T>; TASK_COUNT],
    queue: TaskQueue,
}

impl<T> Default for TaskRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskRegistry<T> {
    /// Create a registry holding only the system task.
    pub fn new() -> Self {
        let mut tasks: [Task<T>; TASK_COUNT] =
            core::array::from_fn(|index| Task::unassigned(TaskId::ALL[index]));
        tasks[TaskId::System.index()] = system_task();

        Self {
            tasks,
            queue: TaskQueue::new(),
        }
    }

    /// Create a registry from task definitions, each placed at its own id.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task<T>>) -> Self {
        tasks.into_iter().fold(Self::new(), Self::with_task)
    }

    /// Builder method to place `task` in its slot and return `self`
    ///
    /// Replacing an enabled task removes the old definition from the queue.
    pub fn with_task(mut self, task: Task<T>) -> Self {
        let id = task.id;
        self.set_enabled(id, false);
        self.tasks[id.index()] = task;
        self.tasks[id.index()].enabled = false;
        self
    }

    pub fn get(&self, id: TaskId) -> &Task<T> {
        &self.tasks[id.index()]
    }

    pub fn get_mut(&mut self, id: TaskId) -> &mut Task<T> {
        &mut self.tasks[id.index()]
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut TaskQueue {
        &mut self.queue
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task<T>> {
        self.tasks.iter()
    }

    /// Add or remove a task from the queue.
    ///
    /// Enabling a task that is already enabled or has no body does nothing, as
    /// does disabling a task that is already disabled. Only the queue and
    /// `dynamic_priority` are touched, never the task's timing.
    pub fn set_enabled(&mut self, id: TaskId, enabled: bool) {
        let task = &self.tasks[id.index()];
        if enabled {
            if task.enabled {
                return;
            }
            if !task.has_body() {
                crate::log_debug!("task {} has no body, not enabling", task.name);
                return;
            }

            let tasks = &self.tasks;
            let added = self.queue.add(id, task.queue_priority(), |queued| {
                tasks[queued.index()].queue_priority()
            });
            if added {
                crate::log_debug!("enabled task {}", task.name);
                self.tasks[id.index()].enabled = true;
            }
        } else {
            if !task.enabled {
                return;
            }

            self.queue.remove(id);
            let task = &mut self.tasks[id.index()];
            task.enabled = false;
            task.dynamic_priority = 0;
            crate::log_debug!("disabled task {}", task.name);
        }
    }

    /// Remove every task from the queue.
    pub fn disable_all(&mut self) {
        for id in TaskId::ALL {
            self.set_enabled(id, false);
        }
    }
}

fn run_system<T>(_event: Event<'_, T>) {}

/// The housekeeping task. The scheduler samples system load after each run.
fn system_task<T>() -> Task<T> {
    Task::new(TaskId::System, "SYSTEM", run_system)
        .with_hz(10)
        .with_priority(Priority::MediumHigh)
}
