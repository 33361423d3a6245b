//! Command handlers. Output goes to the given writer; diagnostics go through
//! `tracing`.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Result};
use api::{ApiClient, ApiError, LoginCredentials, SessionStore, Transport, User, UserFormData};
use clap::ValueEnum;
use state::{after_error, guard, Directory, Route, ThemeStore};
use store::KeyValueStore;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Dark,
    Light,
    Toggle,
}

/// Refuse a protected command without a session.
fn require_session<S: KeyValueStore>(route: Route, session: &SessionStore<S>) -> Result<()> {
    if guard(route, &session.session()) == Route::Login {
        bail!("not logged in; run `usradm login` first");
    }
    Ok(())
}

/// Turn an API failure into a command error, dropping the session when the
/// server no longer accepts it.
fn api_failure<S: KeyValueStore>(session: &SessionStore<S>, error: ApiError) -> anyhow::Error {
    if after_error(&error) == Some(Route::Login) {
        session.logout();
        return anyhow!("{error}; session cleared, run `usradm login` again");
    }
    anyhow!(error)
}

fn validated(form: &UserFormData) -> Result<()> {
    if let Err(errors) = form.validate() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("invalid user: {}", details.join("; "));
    }
    Ok(())
}

fn write_user(out: &mut impl Write, user: &User) -> Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}",
        user.id,
        user.display_name(),
        user.email,
        user.status,
        user.date_of_birth
    )?;
    Ok(())
}

/// First line of `input`, without its line ending.
pub fn read_password(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password given; pass --password, set USRADM_PASSWORD, or pipe it on stdin");
    }
    Ok(password.to_string())
}

pub async fn login<T: Transport, S: KeyValueStore>(
    client: &ApiClient<T, S>,
    email: &str,
    password: &str,
    out: &mut impl Write,
) -> Result<()> {
    let credentials = LoginCredentials::new(email, password);
    // A rejected login is not an expired session; report it as is.
    let result = client.sign_in(&credentials).await?;
    info!(expires_in = result.expires_in, "logged in");
    writeln!(out, "Logged in as {email}")?;
    Ok(())
}

pub fn logout<T: Transport, S: KeyValueStore>(client: &ApiClient<T, S>, out: &mut impl Write) -> Result<()> {
    client.sign_out();
    writeln!(out, "Logged out")?;
    Ok(())
}

pub fn status<T: Transport, S: KeyValueStore>(client: &ApiClient<T, S>, out: &mut impl Write) -> Result<()> {
    if client.session().is_authenticated() {
        writeln!(out, "Logged in")?;
    } else {
        writeln!(out, "Not logged in")?;
    }
    Ok(())
}

pub async fn list_users<T: Transport, S: KeyValueStore>(
    directory: &Directory<T, S>,
    search: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let session = directory.client().session();
    require_session(Route::Dashboard, session)?;
    directory
        .load(search.unwrap_or_default())
        .await
        .map_err(|e| api_failure(session, e))?;

    let snapshot = directory.snapshot();
    if snapshot.users.is_empty() {
        writeln!(out, "No users found")?;
    }
    for user in &snapshot.users {
        write_user(out, user)?;
    }
    Ok(())
}

pub async fn show_user<T: Transport, S: KeyValueStore>(
    client: &ApiClient<T, S>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    require_session(Route::EditUser(id.to_string()), client.session())?;
    let user = client
        .get_user_by_id(id)
        .await
        .map_err(|e| api_failure(client.session(), e))?
        .user;
    write_user(out, &user)
}

pub async fn create_user<T: Transport, S: KeyValueStore>(
    directory: &Directory<T, S>,
    form: &UserFormData,
    out: &mut impl Write,
) -> Result<()> {
    let session = directory.client().session();
    require_session(Route::NewUser, session)?;
    validated(form)?;
    let user = directory
        .create_user(form)
        .await
        .map_err(|e| api_failure(session, e))?;
    writeln!(out, "Created user {}", user.id)?;
    Ok(())
}

pub async fn update_user<T: Transport, S: KeyValueStore>(
    directory: &Directory<T, S>,
    id: &str,
    form: &UserFormData,
    out: &mut impl Write,
) -> Result<()> {
    let session = directory.client().session();
    require_session(Route::EditUser(id.to_string()), session)?;
    validated(form)?;
    let user = directory
        .update_user(id, form)
        .await
        .map_err(|e| api_failure(session, e))?;
    writeln!(out, "Updated user {}", user.id)?;
    Ok(())
}

pub async fn delete_user<T: Transport, S: KeyValueStore>(
    directory: &Directory<T, S>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    let session = directory.client().session();
    require_session(Route::Dashboard, session)?;
    directory
        .delete_user(id)
        .await
        .map_err(|e| api_failure(session, e))?;
    writeln!(out, "Deleted user {id}")?;
    Ok(())
}

/// Show or change the theme. Terminals report no system preference, so an
/// unset theme starts out light.
pub fn theme<S: KeyValueStore>(
    themes: &mut ThemeStore<S>,
    action: Option<ThemeAction>,
    out: &mut impl Write,
) -> Result<()> {
    themes.initialize(false);
    match action {
        Some(ThemeAction::Dark) => themes.set_dark_mode(true),
        Some(ThemeAction::Light) => themes.set_dark_mode(false),
        Some(ThemeAction::Toggle) => {
            themes.toggle();
        }
        None => {}
    }
    writeln!(out, "{}", themes.theme())?;
    Ok(())
}
