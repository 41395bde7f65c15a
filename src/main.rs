use iced::widget::{button, column, container, horizontal_rule, horizontal_space, row, text};
use iced::{Alignment, Element, Length, Task, Theme};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod state;
mod ui;

use api::{ApiClient, ApiError};
use config::{Config, ConfigError};
use state::data::Session;
use state::session::{SessionStore, StoreError};
use ui::{login, photos, register, upload};

const ACCOUNT_CREATED: &str = "Account created. Please log in.";

/// Why the application could not start
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
    #[error(transparent)]
    Ui(#[from] iced::Error),
}

/// Which form is shown while signed out
#[derive(Debug)]
enum AuthScreen {
    Login(login::Login),
    Register(register::Register),
}

/// Main application state
struct PhotoShare {
    client: ApiClient,
    /// Durable copy of the session
    store: SessionStore,
    /// Authoritative in-memory session; `None` shows the auth screens
    session: Option<Session>,
    auth: AuthScreen,
    upload: upload::Upload,
    photos: Option<photos::PhotosList>,
    /// Bumped after every upload; doubles as the photo list generation
    refresh: u64,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Login(login::Message),
    Register(register::Message),
    Upload(upload::Message),
    Photos(photos::Message),
    Logout,
}

impl PhotoShare {
    /// Create a new instance of the application
    fn new(client: ApiClient, store: SessionStore) -> (Self, Task<Message>) {
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not read saved session: {}", e);
                None
            }
        };

        let mut app = PhotoShare {
            client,
            store,
            session,
            auth: AuthScreen::Login(login::Login::new()),
            upload: upload::Upload::new(),
            photos: None,
            refresh: 0,
        };

        let task = match &app.session {
            Some(session) => {
                info!(
                    "🎨 Restored session for {}",
                    session.email.as_deref().unwrap_or("unknown user")
                );
                app.reload_photos()
            }
            None => Task::none(),
        };

        (app, task)
    }

    /// Replace the photo list with a fresh one, releasing the old one's previews
    fn reload_photos(&mut self) -> Task<Message> {
        let Some(session) = &self.session else {
            return Task::none();
        };

        self.refresh += 1;
        let (list, task) =
            photos::PhotosList::new(self.client.clone(), session.token.clone(), self.refresh);
        info!("🔄 Loading photo list {}", list.generation());
        self.photos = Some(list);
        task.map(Message::Photos)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Login(message) => {
                let AuthScreen::Login(screen) = &mut self.auth else {
                    return Task::none();
                };

                let (task, event) = screen.update(message, &self.client);
                match event {
                    login::Event::None => task.map(Message::Login),
                    login::Event::SwitchToRegister => {
                        self.auth = AuthScreen::Register(register::Register::new());
                        Task::none()
                    }
                    login::Event::LoggedIn { token, email } => self.login_success(token, email),
                }
            }
            Message::Register(message) => {
                let AuthScreen::Register(screen) = &mut self.auth else {
                    return Task::none();
                };

                let (task, event) = screen.update(message, &self.client);
                match event {
                    register::Event::None => task.map(Message::Register),
                    register::Event::SwitchToLogin => {
                        self.auth = AuthScreen::Login(login::Login::new());
                        Task::none()
                    }
                    register::Event::Registered => {
                        self.auth = AuthScreen::Login(login::Login::with_notice(ACCOUNT_CREATED));
                        Task::none()
                    }
                }
            }
            Message::Upload(message) => {
                let Some(session) = &self.session else {
                    return Task::none();
                };

                let (task, event) = self.upload.update(message, &self.client, &session.token);
                match event {
                    upload::Event::None => task.map(Message::Upload),
                    upload::Event::Uploaded => {
                        Task::batch([task.map(Message::Upload), self.reload_photos()])
                    }
                }
            }
            Message::Photos(message) => match &mut self.photos {
                Some(list) => list.update(message).map(Message::Photos),
                None => Task::none(),
            },
            Message::Logout => {
                self.logout();
                Task::none()
            }
        }
    }

    fn login_success(&mut self, token: String, email: String) -> Task<Message> {
        let session = match self.store.login_success(&token, Some(&email)) {
            Ok(session) => session,
            Err(e) => {
                // Still usable for this run, it just won't survive a restart
                error!("Could not persist session: {}", e);
                Session {
                    token,
                    email: Some(email),
                }
            }
        };

        self.session = Some(session);
        self.auth = AuthScreen::Login(login::Login::new());
        self.reload_photos()
    }

    fn logout(&mut self) {
        if let Err(e) = self.store.logout() {
            error!("Could not clear saved session: {}", e);
        }

        if let Some(session) = self.session.take() {
            info!(
                "👋 Logged out {}",
                session.email.as_deref().unwrap_or("unknown user")
            );
        }

        // Dropping the list releases every preview it holds
        self.photos = None;
        self.upload = upload::Upload::new();
        self.auth = AuthScreen::Login(login::Login::new());
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let Some(session) = &self.session else {
            return match &self.auth {
                AuthScreen::Login(screen) => screen.view().map(Message::Login),
                AuthScreen::Register(screen) => screen.view().map(Message::Register),
            };
        };

        let mut header = row![text("Photo Share").size(28), horizontal_space()]
            .spacing(16)
            .align_y(Alignment::Center);
        if let Some(email) = &session.email {
            header = header.push(text(email.as_str()).size(14).style(text::secondary));
        }
        header = header.push(
            button(text("Logout"))
                .on_press(Message::Logout)
                .style(button::secondary)
                .padding(8),
        );

        let sidebar = container(self.upload.view().map(Message::Upload))
            .width(280)
            .padding(16)
            .style(container::rounded_box);

        let main: Element<Message> = match &self.photos {
            Some(list) => list.view().map(Message::Photos),
            None => text("Loading photos...").into(),
        };

        column![
            header,
            horizontal_rule(1),
            row![sidebar, container(main).width(Length::Fill)].spacing(20),
        ]
        .spacing(16)
        .padding(20)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photo_share=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!("🌐 Using API at {}", config.api_url);

    let store = match SessionStore::open(&config.session_db_path()) {
        Ok(store) => store,
        Err(e) => {
            // Logins still work, they just won't survive a restart
            warn!("Session store unavailable, keeping session in memory: {}", e);
            SessionStore::open_in_memory()?
        }
    };
    let client = ApiClient::new(&config)?;

    iced::application("Photo Share", PhotoShare::update, PhotoShare::view)
        .theme(PhotoShare::theme)
        .centered()
        .run_with(move || PhotoShare::new(client, store))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn app_with(store: SessionStore) -> PhotoShare {
        let config = Config::new("http://localhost:8000/api", PathBuf::from("/tmp")).unwrap();
        let client = ApiClient::new(&config).unwrap();
        let (app, _) = PhotoShare::new(client, store);
        app
    }

    #[test]
    fn test_starts_signed_out_without_saved_session() {
        let app = app_with(SessionStore::open_in_memory().unwrap());
        assert!(app.session.is_none());
        assert!(app.photos.is_none());
        assert!(matches!(app.auth, AuthScreen::Login(_)));
    }

    #[test]
    fn test_saved_session_is_restored() {
        let store = SessionStore::open_in_memory().unwrap();
        store.login_success("tok123", Some("a@b.com")).unwrap();

        let app = app_with(store);
        assert_eq!(app.session.as_ref().unwrap().token, "tok123");
        assert_eq!(app.photos.as_ref().unwrap().generation(), 1);
    }

    #[test]
    fn test_login_switches_to_authenticated_shell() {
        let mut app = app_with(SessionStore::open_in_memory().unwrap());
        let _ = app.login_success("tok123".into(), "a@b.com".into());

        let session = app.session.clone().unwrap();
        assert_eq!(session.token, "tok123");
        assert_eq!(session.email.as_deref(), Some("a@b.com"));
        assert_eq!(app.store.load().unwrap(), Some(session));
        assert!(app.photos.is_some());
    }

    #[test]
    fn test_each_reload_gets_a_new_generation() {
        let mut app = app_with(SessionStore::open_in_memory().unwrap());
        let _ = app.login_success("tok".into(), "a@b.com".into());
        let first = app.photos.as_ref().unwrap().generation();

        let _ = app.reload_photos();
        let second = app.photos.as_ref().unwrap().generation();
        assert!(second > first);
    }

    #[test]
    fn test_logout_clears_session_everywhere() {
        let mut app = app_with(SessionStore::open_in_memory().unwrap());
        let _ = app.login_success("tok".into(), "a@b.com".into());

        let _ = app.update(Message::Logout);
        assert!(app.session.is_none());
        assert!(app.photos.is_none());
        assert_eq!(app.store.load().unwrap(), None);
    }

    #[test]
    fn test_switching_between_auth_screens() {
        let mut app = app_with(SessionStore::open_in_memory().unwrap());

        let _ = app.update(Message::Login(login::Message::SwitchToRegister));
        assert!(matches!(app.auth, AuthScreen::Register(_)));

        let _ = app.update(Message::Register(register::Message::SwitchToLogin));
        assert!(matches!(app.auth, AuthScreen::Login(_)));
    }

    #[test]
    fn test_upload_without_session_is_ignored() {
        let mut app = app_with(SessionStore::open_in_memory().unwrap());
        let _ = app.update(Message::Upload(upload::Message::Submit));
        assert!(app.photos.is_none());
    }
}
