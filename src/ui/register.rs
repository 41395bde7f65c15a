/// Registration screen with a password strength meter
use iced::widget::{button, column, container, progress_bar, row, text, text_input, Column};
use iced::{Alignment, Element, Length, Task};
use tracing::{error, info};

use super::{error_text, password_field, FORM_WIDTH};
use crate::api::{ApiClient, ApiError};
use crate::state::data::RegisterRequest;

pub const FILL_ALL_FIELDS: &str = "Please fill in all fields";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";
pub const REGISTRATION_FAILED: &str = "Registration error. Please try again.";

/// Highest value `password_strength` returns
pub const MAX_STRENGTH: u8 = 4;

#[derive(Debug, Default)]
pub struct Register {
    username: String,
    email: String,
    password: String,
    password_confirm: String,
    show_password: bool,
    show_password_confirm: bool,
    strength: u8,
    error: Option<String>,
    submitting: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    UsernameChanged(String),
    EmailChanged(String),
    PasswordChanged(String),
    PasswordConfirmChanged(String),
    TogglePassword,
    TogglePasswordConfirm,
    Submit,
    Completed(Result<(), ApiError>),
    SwitchToLogin,
}

/// Events propagated to the parent application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    None,
    Registered,
    SwitchToLogin,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, message: Message, client: &ApiClient) -> (Task<Message>, Event) {
        match message {
            Message::UsernameChanged(username) => self.username = username,
            Message::EmailChanged(email) => self.email = email,
            Message::PasswordChanged(password) => {
                self.strength = password_strength(&password);
                self.password = password;
            }
            Message::PasswordConfirmChanged(confirm) => self.password_confirm = confirm,
            Message::TogglePassword => self.show_password = !self.show_password,
            Message::TogglePasswordConfirm => {
                self.show_password_confirm = !self.show_password_confirm
            }
            Message::Submit => {
                if self.submitting {
                    return (Task::none(), Event::None);
                }

                self.error = self.validate().err().map(str::to_string);
                if self.error.is_some() {
                    return (Task::none(), Event::None);
                }

                self.submitting = true;
                let client = client.clone();
                let request = RegisterRequest {
                    username: self.username.clone(),
                    email: self.email.clone(),
                    password: self.password.clone(),
                    password_confirm: self.password_confirm.clone(),
                };
                let task = Task::perform(
                    async move { client.register(&request).await },
                    Message::Completed,
                );
                return (task, Event::None);
            }
            Message::Completed(result) => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        info!("✅ Account {} created", self.username);
                        return (Task::none(), Event::Registered);
                    }
                    Err(e) => {
                        error!("Registration failed: {}", e);
                        self.error = Some(registration_error_message(&e));
                    }
                }
            }
            Message::SwitchToLogin => return (Task::none(), Event::SwitchToLogin),
        }

        (Task::none(), Event::None)
    }

    /// Checks done before anything is sent
    fn validate(&self) -> Result<(), &'static str> {
        if self.username.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.password_confirm.is_empty()
        {
            return Err(FILL_ALL_FIELDS);
        }

        if self.password != self.password_confirm {
            return Err(PASSWORDS_DIFFER);
        }

        Ok(())
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut form: Column<Message> = column![text("Register").size(32)].spacing(14);

        if let Some(error) = &self.error {
            form = form.push(error_text(error));
        }

        form = form
            .push(
                text_input("Username", &self.username)
                    .on_input(Message::UsernameChanged)
                    .padding(10),
            )
            .push(
                text_input("Email", &self.email)
                    .on_input(Message::EmailChanged)
                    .padding(10),
            )
            .push(password_field(
                "Password",
                &self.password,
                self.show_password,
                Message::PasswordChanged,
                Message::TogglePassword,
            ))
            .push(password_field(
                "Confirm Password",
                &self.password_confirm,
                self.show_password_confirm,
                Message::PasswordConfirmChanged,
                Message::TogglePasswordConfirm,
            ));

        // Meter only takes space once something is typed
        if !self.password.is_empty() {
            form = form.push(
                progress_bar(0.0..=MAX_STRENGTH as f32, self.strength as f32).height(6.0),
            );
        }

        let submit = button(text(if self.submitting { "Registering..." } else { "Register" }))
            .on_press_maybe((!self.submitting).then_some(Message::Submit))
            .padding(10)
            .width(Length::Fill);

        form = form.push(submit).push(
            row![
                text("Already have an account?").size(14),
                button(text("Login").size(14))
                    .on_press(Message::SwitchToLogin)
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

/// Strength level 0..=4 for the meter.
///
/// Five criteria: length >= 8, uppercase, lowercase, digit, symbol.
/// Up to two met is level 1, then one level per extra criterion.
/// The empty password is 0.
pub fn password_strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }

    let criteria = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let met = criteria.iter().filter(|&&ok| ok).count();

    match met {
        0..=2 => 1,
        3 => 2,
        4 => 3,
        _ => 4,
    }
}

/// Flatten a validation body into one line.
///
/// `{"username": ["taken"], "email": ["bad", "used"]}` becomes
/// `"taken, bad, used"`. A top-level list is joined the same way.
pub fn registration_error_message(err: &ApiError) -> String {
    let values: Vec<serde_json::Value> = match err.body_json() {
        Some(serde_json::Value::Object(fields)) => fields.into_iter().map(|(_, v)| v).collect(),
        Some(serde_json::Value::Array(items)) => items,
        _ => return REGISTRATION_FAILED.to_string(),
    };

    let mut messages = Vec::new();
    for value in &values {
        match value {
            serde_json::Value::Array(items) => messages.extend(items.iter().map(json_to_text)),
            other => messages.push(json_to_text(other)),
        }
    }

    let joined = messages.join(", ");
    if joined.is_empty() {
        REGISTRATION_FAILED.to_string()
    } else {
        joined
    }
}

fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
