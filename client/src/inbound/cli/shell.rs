//! One shell invocation: sign in, settle the session, guard the route, run
//! the screen action, print the result, sign out.

use std::io::{self, Write};
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::args::{Command, CourseAction, SettingsArgs, UserAction};
use super::render;
use crate::domain::ports::{AuthGateway, DataGateway, Notifier};
use crate::domain::routing::{self, navigation};
use crate::domain::screens::{
    LearnScreen, LoginScreen, ManageCourseScreen, ManageUsersScreen, NewUser, SettingsScreen,
    UserChanges,
};
use crate::domain::{
    AdminAccess, ChapterDraft, ChapterId, ChapterTitle, Error, ModuleId, Navigation, Role, Route,
    SessionManager, SessionState, UserId, VideoLink,
};

/// Ports the shell drives.
#[derive(Clone)]
pub struct Gateways {
    /// Auth service.
    pub auth: Arc<dyn AuthGateway>,
    /// Table store.
    pub data: Arc<dyn DataGateway>,
    /// Where transient messages go.
    pub notifier: Arc<dyn Notifier>,
    /// Source of `updated_at` timestamps.
    pub clock: Arc<dyn Clock>,
}

/// Why an invocation did not complete.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A destructive action was requested without `--yes`.
    #[error("{action} deletes data; pass --yes to confirm")]
    Unconfirmed {
        /// Subcommand name.
        action: &'static str,
    },
    /// The credentials were not accepted.
    #[error("sign-in failed: {message}")]
    SignIn {
        /// Inline login error.
        message: String,
    },
    /// The route guard sent the user elsewhere.
    #[error("{requested} is not available to this account; redirected to {target}")]
    Redirected {
        /// Path that was asked for.
        requested: String,
        /// Where the guard points instead.
        target: Route,
    },
    /// The session was still being checked.
    #[error("session is still loading")]
    NotReady,
    /// The screen action failed.
    #[error(transparent)]
    Action(#[from] Error),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl ShellError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Unconfirmed { .. } | Self::SignIn { .. } => 2,
            Self::Redirected { .. } => 3,
            Self::NotReady | Self::Action(_) | Self::Output(_) => 1,
        }
    }
}

/// Run `command` for the account identified by `email`/`password`.
///
/// The session manager is always signed out and shut down before returning.
///
/// # Errors
///
/// See [`ShellError`].
pub async fn run(
    command: &Command,
    email: &str,
    password: &str,
    gateways: &Gateways,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    if let Some(action) = command.unconfirmed() {
        return Err(ShellError::Unconfirmed { action });
    }
    let session = SessionManager::start(Arc::clone(&gateways.auth), Arc::clone(&gateways.data));
    let result = drive(&session, command, email, password, gateways, out).await;
    if let Err(err) = session.sign_out().await {
        warn!(error = %err, "sign-out at exit failed");
    }
    session.shutdown().await;
    result
}

async fn drive(
    session: &SessionManager,
    command: &Command,
    email: &str,
    password: &str,
    gateways: &Gateways,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    session.wait_until_ready().await;
    let mut login = LoginScreen::with_credentials(email, password);
    if !login.submit(session).await {
        return Err(ShellError::SignIn {
            message: login.error().unwrap_or("unknown error").to_owned(),
        });
    }
    let state = session.refresh().await;

    let requested = command.path();
    let route = match routing::resolve(&requested, &state) {
        Navigation::Render(route) => route,
        Navigation::Redirect(target) => {
            return Err(ShellError::Redirected { requested, target });
        }
        Navigation::Loading => return Err(ShellError::NotReady),
    };
    info!(route = %route, "running screen");

    match command {
        Command::Nav => render::sidebar(out, &navigation(state.identity()))?,
        Command::Open { .. } => render::route(out, route)?,
        Command::Learn { module, chapter } => {
            learn(gateways, module.as_deref(), chapter.as_deref(), out).await?;
        }
        Command::Course { action } => {
            course(admin_access(&state)?, gateways, action.as_ref(), out).await?;
        }
        Command::Users { action } => {
            users(admin_access(&state)?, session, gateways, action.as_ref(), out).await?;
        }
        Command::Settings(args) => settings(session, gateways, args, out).await?,
    }
    Ok(())
}

fn admin_access(state: &SessionState) -> Result<AdminAccess, Error> {
    state
        .identity()
        .and_then(|identity| identity.admin_access())
        .ok_or_else(|| Error::forbidden("admin access required"))
}

async fn learn(
    gateways: &Gateways,
    module: Option<&str>,
    chapter: Option<&str>,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    let mut screen = LearnScreen::new(Arc::clone(&gateways.data), Arc::clone(&gateways.notifier));
    screen.load().await?;
    if let Some(module) = module {
        screen.select_module(&module_id(module)?).await?;
    }
    if let Some(chapter) = chapter {
        screen.select_chapter(&chapter_id(chapter)?)?;
    }
    render::learn(out, &screen)?;
    Ok(())
}

async fn course(
    access: AdminAccess,
    gateways: &Gateways,
    action: Option<&CourseAction>,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    let mut screen = ManageCourseScreen::new(
        access,
        Arc::clone(&gateways.data),
        Arc::clone(&gateways.notifier),
    );
    screen.load().await?;
    match action {
        None => {}
        Some(CourseAction::AddModule { title }) => {
            screen.create_module(title).await?;
        }
        Some(CourseAction::RenameModule { id, title }) => {
            screen.rename_module(&module_id(id)?, title).await?;
        }
        Some(CourseAction::DeleteModule { id, .. }) => {
            screen.delete_module(&module_id(id)?).await?;
        }
        Some(CourseAction::AddChapter {
            module,
            title,
            link,
            status,
        }) => {
            let draft = ChapterDraft {
                title: chapter_title(title)?,
                module_id: module_id(module)?,
                youtube_link: video_link(link)?,
                status: (*status).into(),
            };
            screen.create_chapter(draft).await?;
        }
        Some(CourseAction::EditChapter {
            id,
            module,
            title,
            link,
            status,
        }) => {
            let id = chapter_id(id)?;
            let mut draft = screen
                .course()
                .iter()
                .flat_map(|entry| &entry.chapters)
                .find(|chapter| chapter.id() == &id)
                .map(|chapter| chapter.draft().clone())
                .ok_or_else(|| Error::not_found(format!("chapter {id} is not listed")))?;
            if let Some(module) = module {
                draft.module_id = module_id(module)?;
            }
            if let Some(title) = title {
                draft.title = chapter_title(title)?;
            }
            if let Some(link) = link {
                draft.youtube_link = video_link(link)?;
            }
            if let Some(status) = status {
                draft.status = (*status).into();
            }
            screen.edit_chapter(&id, draft).await?;
        }
        Some(CourseAction::DeleteChapter { id, .. }) => {
            screen.delete_chapter(&chapter_id(id)?).await?;
        }
    }
    render::course(out, screen.course())?;
    Ok(())
}

async fn users(
    access: AdminAccess,
    session: &SessionManager,
    gateways: &Gateways,
    action: Option<&UserAction>,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    let mut screen = ManageUsersScreen::new(
        access,
        Arc::clone(&gateways.data),
        Arc::clone(&gateways.auth),
        Arc::clone(&gateways.notifier),
    );
    screen.load().await?;
    match action {
        None => {}
        Some(UserAction::Create {
            name,
            email,
            password,
            role,
        }) => {
            let new_user = NewUser::try_from_parts(name, email, password, (*role).into())?;
            screen.create(new_user).await?;
        }
        Some(UserAction::Update {
            id,
            name,
            email,
            role,
            password,
        }) => {
            let id = user_id(id)?;
            let current = screen
                .users()
                .iter()
                .find(|user| user.id() == &id)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("user {id} is not listed")))?;
            let role = role
                .map(Role::from)
                .or(current.role())
                .unwrap_or(Role::User);
            let changes = UserChanges::try_from_parts(
                name.as_deref().unwrap_or(current.name().as_ref()),
                email.as_deref().unwrap_or(current.email().as_ref()),
                role,
                password.as_deref(),
            )?;
            screen.update(&id, changes, session).await?;
        }
        Some(UserAction::Delete { id, .. }) => {
            screen.delete(&user_id(id)?).await?;
        }
    }
    render::users(out, screen.users())?;
    Ok(())
}

async fn settings(
    session: &SessionManager,
    gateways: &Gateways,
    args: &SettingsArgs,
    out: &mut impl Write,
) -> Result<(), ShellError> {
    let mut screen = SettingsScreen::for_session(
        session,
        Arc::clone(&gateways.data),
        Arc::clone(&gateways.auth),
        Arc::clone(&gateways.notifier),
        Arc::clone(&gateways.clock),
    )?;
    if !args.is_empty() {
        let form = screen.form_mut();
        if let Some(name) = &args.name {
            form.name.clone_from(name);
        }
        if let Some(email) = &args.email {
            form.email.clone_from(email);
        }
        if let Some(password) = &args.password {
            form.password = Zeroizing::new(password.clone());
        }
        if let Some(confirm) = &args.confirm_password {
            form.confirm_password = Zeroizing::new(confirm.clone());
        }
        screen.submit(session).await?;
    }
    render::profile(out, screen.identity())?;
    Ok(())
}

fn module_id(raw: &str) -> Result<ModuleId, Error> {
    ModuleId::new(raw).map_err(|err| Error::invalid_request(format!("module id: {err}")))
}

fn chapter_id(raw: &str) -> Result<ChapterId, Error> {
    ChapterId::new(raw).map_err(|err| Error::invalid_request(format!("chapter id: {err}")))
}

fn chapter_title(raw: &str) -> Result<ChapterTitle, Error> {
    ChapterTitle::new(raw).map_err(|err| Error::invalid_request(format!("chapter title: {err}")))
}

fn video_link(raw: &str) -> Result<VideoLink, Error> {
    VideoLink::new(raw).map_err(|err| Error::invalid_request(format!("video link: {err}")))
}

fn user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| Error::invalid_request(format!("user id: {err}")))
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
