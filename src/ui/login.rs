/// Login screen
use iced::widget::{button, column, container, row, text, text_input, Column};
use iced::{Alignment, Element, Length, Task};
use tracing::{info, warn};

use super::{error_text, password_field, FORM_WIDTH};
use crate::api::{ApiClient, ApiError};
use crate::state::data::LoginResponse;

/// Shown for every failed login, network or credentials alike
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Default)]
pub struct Login {
    username: String,
    password: String,
    show_password: bool,
    error: Option<String>,
    /// Set after a successful registration
    notice: Option<String>,
    submitting: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    UsernameChanged(String),
    PasswordChanged(String),
    TogglePassword,
    Submit,
    Completed(Result<LoginResponse, ApiError>),
    SwitchToRegister,
}

/// Events propagated to the parent application
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    LoggedIn { token: String, email: String },
    SwitchToRegister,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    /// Login screen with a notice shown above the form
    pub fn with_notice(notice: impl Into<String>) -> Self {
        Login {
            notice: Some(notice.into()),
            ..Self::default()
        }
    }

    pub fn update(&mut self, message: Message, client: &ApiClient) -> (Task<Message>, Event) {
        match message {
            Message::UsernameChanged(username) => self.username = username,
            Message::PasswordChanged(password) => self.password = password,
            Message::TogglePassword => self.show_password = !self.show_password,
            Message::Submit => {
                if self.submitting {
                    return (Task::none(), Event::None);
                }

                self.error = None;
                self.submitting = true;

                let client = client.clone();
                let username = self.username.clone();
                let password = self.password.clone();
                let task = Task::perform(
                    async move { client.login(&username, &password).await },
                    Message::Completed,
                );
                return (task, Event::None);
            }
            Message::Completed(result) => {
                self.submitting = false;
                return (Task::none(), self.finish(result));
            }
            Message::SwitchToRegister => return (Task::none(), Event::SwitchToRegister),
        }

        (Task::none(), Event::None)
    }

    fn finish(&mut self, result: Result<LoginResponse, ApiError>) -> Event {
        match result {
            Ok(response) => {
                // The header needs something to show even if the server omits the email
                let email = response.email.unwrap_or_else(|| self.username.clone());
                info!("🔓 Logged in as {}", email);
                self.password.clear();
                Event::LoggedIn {
                    token: response.access,
                    email,
                }
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                self.error = Some(INVALID_CREDENTIALS.to_string());
                Event::None
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut form: Column<Message> = column![text("Login").size(32)].spacing(14);

        if let Some(notice) = &self.notice {
            form = form.push(text(notice.as_str()).size(14).style(text::success));
        }
        if let Some(error) = &self.error {
            form = form.push(error_text(error));
        }

        let submit = button(text(if self.submitting { "Logging in..." } else { "Login" }))
            .on_press_maybe((!self.submitting).then_some(Message::Submit))
            .padding(10)
            .width(Length::Fill);

        form = form
            .push(
                text_input("Username", &self.username)
                    .on_input(Message::UsernameChanged)
                    .on_submit(Message::Submit)
                    .padding(10),
            )
            .push(password_field(
                "Password",
                &self.password,
                self.show_password,
                Message::PasswordChanged,
                Message::TogglePassword,
            ))
            .push(submit)
            .push(
                row![
                    text("Don't have an account?").size(14),
                    button(text("Register").size(14))
                        .on_press(Message::SwitchToRegister)
                        .style(button::text),
                ]
                .spacing(4)
                .align_y(Alignment::Center),
            );

        container(form.width(FORM_WIDTH))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(username: &str) -> Login {
        Login {
            username: username.into(),
            password: "secret".into(),
            submitting: true,
            ..Login::default()
        }
    }

    #[test]
    fn test_success_uses_server_token_and_email() {
        let mut login = typed("alice");
        let event = login.finish(Ok(LoginResponse {
            access: "tok123".into(),
            email: Some("a@b.com".into()),
        }));

        assert_eq!(
            event,
            Event::LoggedIn {
                token: "tok123".into(),
                email: "a@b.com".into()
            }
        );
        assert!(login.password.is_empty());
    }

    #[test]
    fn test_missing_email_falls_back_to_username() {
        let mut login = typed("alice");
        let event = login.finish(Ok(LoginResponse {
            access: "tok123".into(),
            email: None,
        }));

        assert_eq!(
            event,
            Event::LoggedIn {
                token: "tok123".into(),
                email: "alice".into()
            }
        );
    }

    #[test]
    fn test_every_failure_is_invalid_credentials() {
        for err in [
            ApiError::Network("connection refused".into()),
            ApiError::Status {
                status: 401,
                body: r#"{"detail":"No active account"}"#.into(),
            },
        ] {
            let mut login = typed("alice");
            assert_eq!(login.finish(Err(err)), Event::None);
            assert_eq!(login.error.as_deref(), Some(INVALID_CREDENTIALS));
        }
    }
}
