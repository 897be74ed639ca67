//! This module provides a client to connect to the task API server

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::Settings;
use crate::error::ServiceError;
use crate::session::Session;
use crate::task::{Task, TaskId};
use crate::traits::{AuthService, NewTask, TaskService};

static LOGIN_PATH: &str = "api/login";
static REGISTER_PATH: &str = "api/register";
static TASKS_PATH: &str = "api/tasks";
static ADD_TASK_PATH: &str = "api/add-task";
static UPDATE_TASK_PATH: &str = "api/update-task/";


#[derive(Deserialize)]
struct LoginReply {
    token: String,
}

#[derive(Deserialize)]
struct TasksReply {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct TaskReply {
    task: Task,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}


/// A task and auth service that fetches its data from the task API server
pub struct Client {
    settings: Settings,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new(settings: Settings) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn update_task_url(&self, id: &TaskId) -> Result<Url, ServiceError> {
        let mut url = self.settings.endpoint(UPDATE_TASK_PATH)?;
        // Push the ID as a proper path segment, so that it is percent-encoded
        url.path_segments_mut()
            .map_err(|_| ServiceError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_AGENT, crate::config::user_agent())
    }

    fn authenticated(&self, method: reqwest::Method, url: Url, session: &Session) -> RequestBuilder {
        self.request(method, url)
            .header(AUTHORIZATION, session.bearer())
    }
}

/// Turns non-success HTTP statuses into errors
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> ServiceError {
    if status == StatusCode::UNAUTHORIZED {
        log::debug!("Unauthorized: {}", body);
        return ServiceError::Unauthorized;
    }
    // The server describes most of its errors in an `error` field
    let message = match serde_json::from_str::<ErrorReply>(body) {
        Ok(reply) => reply.error,
        Err(_) => body.to_string(),
    };
    ServiceError::Status { status: status.as_u16(), message }
}


#[async_trait]
impl AuthService for Client {
    async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let url = self.settings.endpoint(LOGIN_PATH)?;
        log::debug!("Logging in as {} at {}", username, url);

        let response = self.request(reqwest::Method::POST, url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let reply: LoginReply = check_status(response).await?.json().await?;

        log::info!("Logged in as {}", username);
        Ok(Session::new(username, reply.token))
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ServiceError> {
        let url = self.settings.endpoint(REGISTER_PATH)?;
        log::debug!("Registering user {} at {}", username, url);

        let response = self.request(reqwest::Method::POST, url)
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;
        check_status(response).await?;

        log::info!("Registered user {}", username);
        Ok(())
    }
}

#[async_trait]
impl TaskService for Client {
    async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, ServiceError> {
        let url = self.settings.endpoint(TASKS_PATH)?;
        log::debug!("Fetching tasks from {}", url);

        let response = self.authenticated(reqwest::Method::GET, url, session)
            .send()
            .await?;
        let reply: TasksReply = check_status(response).await?.json().await?;

        log::info!("Fetched {} tasks", reply.tasks.len());
        Ok(reply.tasks)
    }

    async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, ServiceError> {
        let url = self.settings.endpoint(ADD_TASK_PATH)?;
        log::debug!("Adding task {:?} at {}", task.description(), url);

        let response = self.authenticated(reqwest::Method::POST, url, session)
            .json(task)
            .send()
            .await?;
        let reply: TaskReply = check_status(response).await?.json().await?;

        log::info!("Added task {}", reply.task.id());
        Ok(reply.task)
    }

    async fn update_task(&self, session: &Session, id: &TaskId, completed: bool) -> Result<(), ServiceError> {
        let url = self.update_task_url(id)?;
        log::debug!("Setting completion of task {} to {} at {}", id, completed, url);

        let response = self.authenticated(reqwest::Method::PUT, url, session)
            .json(&json!({ "completed": completed }))
            .send()
            .await?;
        match check_status(response).await {
            Err(ServiceError::Status { status: 404, .. }) => Err(ServiceError::NotFound(id.clone())),
            Err(err) => Err(err),
            Ok(_) => {
                log::info!("Task {} is now {}", id, if completed { "completed" } else { "pending" });
                Ok(())
            },
        }
    }
}
