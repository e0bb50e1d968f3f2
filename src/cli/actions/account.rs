use crate::{
    authz::Role,
    config::AppConfig,
    session::{types::RegisterRequest, LoginOutcome, SessionStore},
};
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct LoginArgs {
    pub config: AppConfig,
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub config: AppConfig,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub role: Option<Role>,
}

#[derive(Debug)]
pub struct LogoutArgs {
    pub config: AppConfig,
}

/// Sign in and persist the session.
/// # Errors
/// Returns the service message when the login is refused.
pub async fn login(args: LoginArgs) -> Result<String> {
    let store = SessionStore::from_config(&args.config)?;

    match store
        .login(&args.email, args.password.expose_secret())
        .await
    {
        LoginOutcome::Success(identity) => Ok(format!(
            "Signed in as {} <{}> ({}); dashboard: {}",
            identity.display_name(),
            identity.email,
            identity.role,
            identity.role.dashboard_path()
        )),
        LoginOutcome::Failure { message } => bail!(message),
    }
}

/// Create an account and sign in with it.
/// # Errors
/// Returns an error if validation or the registration request fails.
pub async fn register(args: RegisterArgs) -> Result<String> {
    let store = SessionStore::from_config(&args.config)?;

    let identity = store
        .register(RegisterRequest {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            password: args.password.expose_secret().to_string(),
            role: args.role,
        })
        .await
        .context("registration failed")?;

    Ok(format!(
        "Registered {} <{}> ({}); dashboard: {}",
        identity.display_name(),
        identity.email,
        identity.role,
        identity.role.dashboard_path()
    ))
}

/// Forget the persisted session. Purely local.
/// # Errors
/// Returns an error only if the session store cannot be constructed.
pub fn logout(args: &LogoutArgs) -> Result<String> {
    let store = SessionStore::from_config(&args.config)?;
    store.logout();
    Ok("Signed out".to_string())
}
