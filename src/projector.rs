//! Turns a flat list of tasks into date groups that are ready to be displayed
//!
//! [`project`] is a pure function. [`TaskList`] wraps it with the calls to a [`TaskService`]: every change it asks the service for
//! is followed by a full re-fetch of the task list, so that what is displayed is always what the server has, never a locally patched copy.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{Error, MalformedField, MalformedTask};
use crate::session::Session;
use crate::task::{Due, Priority, Task, TaskId};
use crate::traits::{NewTask, TaskService};


/// The key tasks are grouped by.
///
/// Variants are declared in display order: the undated group comes after every dated group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Dated(NaiveDate),
    Undated,
}

impl GroupKey {
    fn of(task: &Task) -> Self {
        match task.due().and_then(|due| due.date()) {
            Some(date) => GroupKey::Dated(date),
            None => GroupKey::Undated,
        }
    }
}

/// Tasks that are due the same day (or that have no valid due date)
#[derive(Clone, Debug, PartialEq)]
pub struct DateGroup {
    key: GroupKey,
    tasks: Vec<Task>,
}

impl DateGroup {
    pub fn key(&self) -> GroupKey { self.key }
    pub fn tasks(&self) -> &[Task] { &self.tasks }

    /// The day of this group, or `None` for the undated group
    pub fn date(&self) -> Option<NaiveDate> {
        match self.key {
            GroupKey::Dated(d) => Some(d),
            GroupKey::Undated => None,
        }
    }

    pub fn is_undated(&self) -> bool {
        self.key == GroupKey::Undated
    }
}

/// Pending and completed tasks, grouped by date
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pending: Vec<DateGroup>,
    completed: Vec<DateGroup>,
    malformed: Vec<MalformedTask>,
}

impl Projection {
    pub fn pending(&self) -> &[DateGroup] { &self.pending }
    pub fn completed(&self) -> &[DateGroup] { &self.completed }
    /// Tasks that have been displayed using raw values, because some of their fields could not be understood
    pub fn malformed(&self) -> &[MalformedTask] { &self.malformed }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|g| g.tasks.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.iter().map(|g| g.tasks.len()).sum()
    }

    /// Iterate over every task of this projection, pending ones first
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter()
            .chain(self.completed.iter())
            .flat_map(|g| g.tasks.iter())
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks().find(|t| t.id() == id)
    }
}


/// Order of tasks inside a group: no time first, then by time, then by priority (urgent first).
/// The ID is the last tie-breaker, so that the result does not depend on the input order.
fn compare_in_group(a: &Task, b: &Task) -> Ordering {
    let time_a = a.due().and_then(Due::time);
    let time_b = b.due().and_then(Due::time);

    time_a.cmp(&time_b)
        .then_with(|| a.priority_rank().cmp(&b.priority_rank()))
        .then_with(|| a.id().cmp(b.id()))
}

fn malformed_fields(task: &Task) -> Vec<MalformedTask> {
    let mut found = Vec::new();
    if let Some(Due::Malformed(raw)) = task.due() {
        found.push(MalformedTask { id: task.id().clone(), field: MalformedField::Due, raw: raw.clone() });
    }
    if let Some(raw) = task.unknown_priority() {
        found.push(MalformedTask { id: task.id().clone(), field: MalformedField::Priority, raw: raw.to_string() });
    }
    found
}

fn into_groups(map: BTreeMap<GroupKey, Vec<Task>>) -> Vec<DateGroup> {
    map.into_iter()
        .filter(|(_, tasks)| tasks.is_empty() == false)
        .map(|(key, mut tasks)| {
            tasks.sort_by(compare_in_group);
            DateGroup { key, tasks }
        })
        .collect()
}

/// Group and sort tasks for display.
///
/// Every task ends up in exactly one group, of either the pending or the completed list.
/// Groups are sorted by date, the undated group being the last one. Empty groups are never returned.
/// Tasks whose date cannot be parsed are put in the undated group, and reported in [`Projection::malformed`].
pub fn project(tasks: &[Task]) -> Projection {
    let mut pending: BTreeMap<GroupKey, Vec<Task>> = BTreeMap::new();
    let mut completed: BTreeMap<GroupKey, Vec<Task>> = BTreeMap::new();
    let mut malformed = Vec::new();

    for task in tasks {
        for issue in malformed_fields(task) {
            log::warn!("{}. Displaying it with its raw value", issue);
            malformed.push(issue);
        }

        let side = if task.completed() { &mut completed } else { &mut pending };
        side.entry(GroupKey::of(task))
            .or_insert_with(Vec::new)
            .push(task.clone());
    }

    malformed.sort_by(|a, b| a.id.cmp(&b.id));

    Projection {
        pending: into_groups(pending),
        completed: into_groups(completed),
        malformed,
    }
}



/// The task list of a logged-in user, as last fetched from a task service
pub struct TaskList<S: TaskService> {
    service: S,
    session: Session,

    /// The last successful projection. It is kept when further requests fail
    projection: Option<Projection>,
}

impl<S: TaskService> TaskList<S> {
    /// Create a task list. This does not fetch anything yet
    pub fn new(service: S, session: Session) -> Self {
        Self { service, session, projection: None }
    }

    pub fn service(&self) -> &S { &self.service }
    pub fn session(&self) -> &Session { &self.session }

    /// The last successfully fetched projection, if any
    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Fetch the tasks again, and re-project them.
    ///
    /// In case of failure, the previous projection is kept.
    pub async fn refresh(&mut self) -> Result<&Projection, Error> {
        let tasks = match self.service.list_tasks(&self.session).await {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("Unable to fetch tasks: {}. Keeping the previous view", err);
                return Err(Error::FetchFailed(err));
            },
        };

        let projection: &Projection = self.projection.insert(project(&tasks));
        log::debug!("{} pending and {} completed tasks", projection.pending_count(), projection.completed_count());
        Ok(projection)
    }

    /// Ask the service to change the completion status of a task, then fetch the tasks again.
    ///
    /// This never retries. In case the update fails, the previous projection is kept, so that the user can try again.
    pub async fn toggle_completion(&mut self, id: &TaskId, completed: bool) -> Result<&Projection, Error> {
        if let Err(err) = self.service.update_task(&self.session, id, completed).await {
            log::warn!("Unable to update task {}: {}", id, err);
            return Err(Error::UpdateFailed { id: id.clone(), source: err });
        }
        self.refresh().await
    }

    /// Mark a task as completed
    pub async fn complete(&mut self, id: &TaskId) -> Result<&Projection, Error> {
        self.toggle_completion(id, true).await
    }

    /// Mark a task as not completed
    pub async fn undo(&mut self, id: &TaskId) -> Result<&Projection, Error> {
        self.toggle_completion(id, false).await
    }

    /// Create a task, then fetch the tasks again.
    ///
    /// Blank descriptions are rejected before anything is sent.
    pub async fn add_task(&mut self, description: &str, due: Option<Due>, priority: Option<Priority>) -> Result<Task, Error> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::InvalidTask("please enter a task description".to_string()));
        }
        if let Some(Due::Malformed(raw)) = &due {
            return Err(Error::InvalidTask(format!("invalid due date {:?}", raw)));
        }

        let new_task = NewTask::new(description, due, priority.unwrap_or_default());
        let created = self.service.create_task(&self.session, &new_task).await
            .map_err(Error::CreateFailed)?;
        log::info!("Task {} added", created.id());

        self.refresh().await?;
        Ok(created)
    }
}
