//! This module provides a task service that lives in the current process
//!
//! It honours the same contract as the server (IDs are assigned by the service, unknown tokens and unknown tasks are rejected),
//! so that it can stand in for a [`Client`](crate::client::Client) in tests, or when working offline.
//! Its content can be stored to a JSON file.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::mock_behaviour::MockBehaviour;
use crate::session::Session;
use crate::task::{Task, TaskId};
use crate::traits::{AuthService, NewTask, TaskService};


/// A task service that stores its data in memory, and optionally in a local file
#[derive(Debug)]
pub struct LocalTaskService {
    backing_file: Option<PathBuf>,
    data: Mutex<StoredData>,

    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredData {
    /// Passwords, by username. This is a local stand-in, not a secure store
    users: HashMap<String, StoredUser>,
    /// Usernames, by token
    sessions: HashMap<String, String>,
    /// Tasks, by username
    tasks: BTreeMap<String, Vec<Task>>,
    last_id: u64,
    #[serde(default)]
    last_session: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredUser {
    email: String,
    password: String,
}


impl LocalTaskService {
    /// Create an empty service, that is not backed by any file
    pub fn new() -> Self {
        Self {
            backing_file: None,
            data: Mutex::new(StoredData::default()),
            mock_behaviour: None,
        }
    }

    /// Create an empty service, that will be stored to `path` by [`Self::save_to_file`]
    pub fn with_file(path: &Path) -> Self {
        Self {
            backing_file: Some(PathBuf::from(path)),
            ..Self::new()
        }
    }

    /// Initialize a service from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let file = std::fs::File::open(path)?;
        let data: StoredData = serde_json::from_reader(file)?;

        Ok(Self {
            backing_file: Some(PathBuf::from(path)),
            data: Mutex::new(data),
            mock_behaviour: None,
        })
    }

    /// Initialize a service from `path`, or create an empty one if this file does not exist yet.
    ///
    /// An existing file that cannot be read is an error: it is the only copy of its tasks, so it must not be replaced.
    pub fn open_or_create(path: &Path) -> Result<Self, ServiceError> {
        match Self::from_file(path) {
            Err(ServiceError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No task file at {:?} yet. Starting from an empty one", path);
                Ok(Self::with_file(path))
            },
            other => other,
        }
    }

    /// Make this service fail on purpose, according to `behaviour`
    pub fn set_mock_behaviour(&mut self, behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = behaviour;
    }

    /// Store the current content to the backing file (if any)
    pub fn save_to_file(&self) -> Result<(), ServiceError> {
        let path = match &self.backing_file {
            None => {
                log::debug!("This task service has no backing file, not saving it");
                return Ok(());
            },
            Some(p) => p,
        };

        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &*self.lock())?;
        log::debug!("Tasks saved to {:?}", path);
        Ok(())
    }

    /// Add a task as if it had been created on the server earlier, regardless of its ID and completion status.
    /// The user is created if needed.
    pub fn insert_task(&self, username: &str, task: Task) {
        let mut data = self.lock();
        if let Ok(n) = task.id().as_str().parse::<u64>() {
            data.last_id = data.last_id.max(n);
        }
        data.tasks.entry(username.to_string()).or_insert_with(Vec::new).push(task);
    }

    /// Returns a session for this user without checking any password. The user is created if needed
    pub fn open_session(&self, username: &str) -> Session {
        let mut data = self.lock();
        data.users.entry(username.to_string()).or_insert_with(|| StoredUser { email: String::new(), password: String::new() });
        new_session(&mut data, username)
    }

    /// The current tasks of a user, as stored
    pub fn tasks_of(&self, username: &str) -> Vec<Task> {
        self.lock().tasks.get(username).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, StoredData> {
        // A panic while holding the lock cannot leave the data half-modified, so that a poisoned lock is still usable
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_behaviour<F>(&self, check: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), ServiceError>,
    {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => match behaviour.lock() {
                Ok(mut b) => check(&mut *b),
                Err(poisoned) => check(&mut *poisoned.into_inner()),
            },
        }
    }
}

impl Default for LocalTaskService {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session(data: &mut StoredData, username: &str) -> Session {
    data.last_session += 1;
    let token = format!("local-{}-{}", username, data.last_session);
    data.sessions.insert(token.clone(), username.to_string());
    Session::new(username, token)
}

fn username_for(data: &StoredData, session: &Session) -> Result<String, ServiceError> {
    match data.sessions.get(session.token()) {
        Some(user) if user == session.username() => Ok(user.clone()),
        _ => Err(ServiceError::Unauthorized),
    }
}


#[async_trait]
impl AuthService for LocalTaskService {
    async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        self.check_behaviour(MockBehaviour::can_login)?;

        let mut data = self.lock();
        let valid = matches!(data.users.get(username), Some(user) if user.password == password);
        if valid == false {
            return Err(ServiceError::Status { status: 401, message: "Invalid credentials".to_string() });
        }
        Ok(new_session(&mut data, username))
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ServiceError> {
        self.check_behaviour(MockBehaviour::can_register)?;

        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Status { status: 400, message: "Username and password are required".to_string() });
        }
        let mut data = self.lock();
        if data.users.contains_key(username) {
            return Err(ServiceError::Status { status: 400, message: "User already exists".to_string() });
        }
        data.users.insert(username.to_string(), StoredUser { email: email.to_string(), password: password.to_string() });
        log::info!("Registered local user {}", username);
        Ok(())
    }
}

#[async_trait]
impl TaskService for LocalTaskService {
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, ServiceError> {
        self.check_behaviour(MockBehaviour::can_list_tasks)?;

        let data = self.lock();
        let username = username_for(&data, session)?;
        Ok(data.tasks.get(&username).cloned().unwrap_or_default())
    }

    async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, ServiceError> {
        self.check_behaviour(MockBehaviour::can_create_task)?;

        if task.description().trim().is_empty() {
            return Err(ServiceError::Status { status: 400, message: "Task description is required".to_string() });
        }
        let mut data = self.lock();
        let username = username_for(&data, session)?;

        data.last_id += 1;
        let created = Task::new(
            TaskId::from(data.last_id),
            task.description().to_string(),
            task.due().cloned(),
            Some(task.priority()),
            false,
        );
        data.tasks.entry(username).or_insert_with(Vec::new).push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, session: &Session, id: &TaskId, completed: bool) -> Result<(), ServiceError> {
        self.check_behaviour(MockBehaviour::can_update_task)?;

        let mut data = self.lock();
        let username = username_for(&data, session)?;
        let task = data.tasks.get_mut(&username)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id() == id))
            .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
        task.set_completed(completed);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Due, Priority};

    #[tokio::test]
    async fn register_then_login() {
        let service = LocalTaskService::new();
        service.register("alice", "alice@example.com", "pw").await.unwrap();
        assert!(service.register("alice", "other@example.com", "pw2").await.is_err());
        assert!(service.login("alice", "wrong").await.is_err());

        let session = service.login("alice", "pw").await.unwrap();
        assert_eq!(session.username(), "alice");
        assert!(service.list_tasks(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let service = LocalTaskService::new();
        let forged = Session::new("mallory", "made-up");
        assert!(matches!(service.list_tasks(&forged).await, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn tasks_belong_to_their_user() {
        let service = LocalTaskService::new();
        let alice = service.open_session("alice");
        let bob = service.open_session("bob");

        let created = service.create_task(&alice, &NewTask::new("Water plants", Due::parse("2024-06-01"), Priority::Low)).await.unwrap();
        assert!(created.completed() == false);
        assert_eq!(service.list_tasks(&alice).await.unwrap(), vec![created.clone()]);
        assert!(service.list_tasks(&bob).await.unwrap().is_empty());

        assert!(matches!(service.update_task(&bob, created.id(), true).await, Err(ServiceError::NotFound(_))));
        service.update_task(&alice, created.id(), true).await.unwrap();
        assert!(service.tasks_of("alice")[0].completed());
    }

    #[test]
    fn serde_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let service = LocalTaskService::with_file(&path);
        let session = service.open_session("alice");
        service.insert_task("alice", Task::new(TaskId::from(41), "Old task".to_string(), Due::parse("2024-01-10T09:00"), Some(Priority::High), true));
        service.save_to_file().unwrap();

        let retrieved = LocalTaskService::from_file(&path).unwrap();
        assert_eq!(*service.lock(), *retrieved.lock());
        assert_eq!(retrieved.tasks_of("alice").len(), 1);
        // Sessions survive, so that a saved session can be used again
        assert!(username_for(&retrieved.lock(), &session).is_ok());
    }

    #[test]
    fn open_or_create() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("new.json");
        let service = LocalTaskService::open_or_create(&missing).unwrap();
        assert!(service.tasks_of("alice").is_empty());

        let saved = dir.path().join("saved.json");
        let service = LocalTaskService::with_file(&saved);
        service.insert_task("alice", Task::new(TaskId::from(1), "Keep me".to_string(), None, None, false));
        service.save_to_file().unwrap();
        assert_eq!(LocalTaskService::open_or_create(&saved).unwrap().tasks_of("alice").len(), 1);

        let broken = dir.path().join("broken.json");
        let content = r#"{"users": {}, "sessions": {}, "tasks": {"alice": []}, "last_id": 3,}"#;
        std::fs::write(&broken, content).unwrap();
        assert!(matches!(LocalTaskService::open_or_create(&broken), Err(ServiceError::Json(_))));
        // The broken file is left untouched
        assert_eq!(std::fs::read_to_string(&broken).unwrap(), content);
    }

    #[tokio::test]
    async fn logging_in_does_not_consume_task_ids() {
        let service = LocalTaskService::new();
        service.register("alice", "alice@example.com", "pw").await.unwrap();
        let first = service.login("alice", "pw").await.unwrap();
        let second = service.login("alice", "pw").await.unwrap();
        assert_ne!(first.token(), second.token());

        let a = service.create_task(&second, &NewTask::new("One", None, Priority::Low)).await.unwrap();
        service.login("alice", "pw").await.unwrap();
        let b = service.create_task(&second, &NewTask::new("Two", None, Priority::Low)).await.unwrap();
        assert_eq!(a.id(), &TaskId::from(1));
        assert_eq!(b.id(), &TaskId::from(2));
    }
}
