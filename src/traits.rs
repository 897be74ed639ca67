//! Contracts of the external services this crate consumes

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ServiceError;
use crate::session::Session;
use crate::task::{Due, Priority, Task, TaskId};

/// Registers users and hands out sessions
#[async_trait]
pub trait AuthService {
    /// Exchange credentials for a session (that holds a bearer token)
    async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError>;

    /// Create a new user account. This does not log in.
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ServiceError>;
}

/// Stores the tasks of every user.
///
/// Every call is authenticated by the given session.
#[async_trait]
pub trait TaskService {
    /// Returns every task of the session's user, in no particular order
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, ServiceError>;

    /// Create a task, and return it as it has been stored
    async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, ServiceError>;

    /// Change the completion status of a task
    async fn update_task(&self, session: &Session, id: &TaskId, completed: bool) -> Result<(), ServiceError>;
}

#[async_trait]
impl<'a, T: AuthService + Sync + ?Sized> AuthService for &'a T {
    async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        (**self).login(username, password).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ServiceError> {
        (**self).register(username, email, password).await
    }
}

#[async_trait]
impl<'a, T: TaskService + Sync + ?Sized> TaskService for &'a T {
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, ServiceError> {
        (**self).list_tasks(session).await
    }

    async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, ServiceError> {
        (**self).create_task(session, task).await
    }

    async fn update_task(&self, session: &Session, id: &TaskId, completed: bool) -> Result<(), ServiceError> {
        (**self).update_task(session, id, completed).await
    }
}


/// A task that has not been sent to a task service yet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTask {
    #[serde(rename = "task")]
    description: String,
    #[serde(rename = "date", serialize_with = "serialize_due")]
    due: Option<Due>,
    priority: Priority,
}

impl NewTask {
    pub fn new<S: ToString>(description: S, due: Option<Due>, priority: Priority) -> Self {
        Self { description: description.to_string(), due, priority }
    }

    pub fn description(&self) -> &str { &self.description }
    pub fn due(&self) -> Option<&Due> { self.due.as_ref() }
    pub fn priority(&self) -> Priority { self.priority }
}

fn serialize_due<S>(due: &Option<Due>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match due {
        None => serializer.serialize_none(),
        Some(d) => serializer.serialize_str(&d.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_wire_format() {
        let dated = NewTask::new("Dentist", Due::parse("2024-05-02T14:30"), Priority::High);
        assert_eq!(serde_json::to_value(&dated).unwrap(), serde_json::json!({
            "task": "Dentist",
            "date": "2024-05-02T14:30",
            "priority": "high",
        }));

        let undated = NewTask::new("Read a book", None, Priority::default());
        assert_eq!(serde_json::to_value(&undated).unwrap(), serde_json::json!({
            "task": "Read a book",
            "date": null,
            "priority": "medium",
        }));
    }
}
