//! Support for library configuration options

use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::Error;

/// Name of the environment variable that holds the base URL of the task API
pub const API_URL_VAR: &str = "SMART_TASKS_API_URL";
/// Name of the environment variable that holds the request timeout, in seconds
pub const TIMEOUT_VAR: &str = "SMART_TASKS_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Product name sent in the `User-Agent` header of every request.
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("SmartTaskScheduler".to_string())));

/// The `User-Agent` header value, e.g. `SmartTaskScheduler/0.1.0`
pub fn user_agent() -> String {
    let product = match PRODUCT_NAME.lock() {
        Ok(name) => name.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    format!("{}/{}", product, env!("CARGO_PKG_VERSION"))
}


/// Where and how to reach the task API
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    api_url: Url,
    timeout: Duration,
}

impl Settings {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, Error> {
        let api_url = Url::parse(api_url)
            .map_err(|err| Error::Config(format!("invalid API URL {:?}: {}", api_url, err)))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::Config(format!("API URL {} cannot be used as a base URL", api_url)));
        }
        Ok(Self { api_url, timeout })
    }

    /// Read the settings from the environment, falling back to defaults for missing variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = match lookup(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => {
                let secs = raw.trim().parse::<u64>()
                    .map_err(|err| Error::Config(format!("invalid {} value {:?}: {}", TIMEOUT_VAR, raw, err)))?;
                Duration::from_secs(secs)
            },
        };
        log::debug!("Using task API at {} (timeout {:?})", api_url, timeout);
        Self::new(&api_url, timeout)
    }

    pub fn api_url(&self) -> &Url { &self.api_url }
    pub fn timeout(&self) -> Duration { self.timeout }

    /// Build the URL of an API endpoint, e.g. `api/tasks`
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        // Without a trailing slash, `join` would replace the last segment of the base path
        let mut base = self.api_url.clone();
        if base.path().ends_with('/') == false {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.api_url().as_str(), "http://localhost:8000/");
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn from_variables() {
        let settings = Settings::from_lookup(|var| match var {
            API_URL_VAR => Some("https://tasks.example.com/v1".to_string()),
            TIMEOUT_VAR => Some("5".to_string()),
            _ => None,
        }).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.endpoint("api/tasks").unwrap().as_str(), "https://tasks.example.com/v1/api/tasks");
        assert_eq!(settings.endpoint("/api/update-task/3").unwrap().as_str(), "https://tasks.example.com/v1/api/update-task/3");
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(Settings::new("not a url", DEFAULT_TIMEOUT), Err(Error::Config(_))));
        assert!(matches!(Settings::new("mailto:someone@example.com", DEFAULT_TIMEOUT), Err(Error::Config(_))));
        let bad_timeout = Settings::from_lookup(|var| match var {
            TIMEOUT_VAR => Some("forever".to_string()),
            _ => None,
        });
        assert!(matches!(bad_timeout, Err(Error::Config(_))));
    }

    #[test]
    fn product_name_is_in_the_user_agent() {
        assert!(user_agent().contains(env!("CARGO_PKG_VERSION")));
    }
}
