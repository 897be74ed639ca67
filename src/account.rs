//! Logging in and registering, with the checks that can be done before calling the auth service

use crate::error::Error;
use crate::session::Session;
use crate::traits::AuthService;

/// Log in, and return the session that task services expect
pub async fn login<A: AuthService>(auth: &A, username: &str, password: &str) -> Result<Session, Error> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials("username and password are required".to_string()));
    }

    auth.login(username, password).await
        .map_err(|err| {
            log::warn!("Login failed for {}: {}", username, err);
            Error::AuthFailed(err)
        })
}

/// Create an account. Users have to [`login`] afterwards
pub async fn register<A: AuthService>(auth: &A, username: &str, email: &str, password: &str) -> Result<(), Error> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials("username and password are required".to_string()));
    }
    if email.contains('@') == false {
        return Err(Error::InvalidCredentials(format!("{:?} is not a valid email address", email)));
    }

    auth.register(username, email, password).await
        .map_err(|err| {
            log::warn!("Registration failed for {}: {}", username, err);
            Error::AuthFailed(err)
        })
}
