/// Share one photo with another user by email
use iced::widget::{button, column, row, text, text_input};
use iced::{Element, Length, Task};
use serde_json::Value;
use tracing::{error, info};

use crate::api::{ApiClient, ApiError};
use crate::state::data::ShareRequest;

pub const EMPTY_EMAIL: &str = "Please enter an email";
pub const SHARED: &str = "Photo successfully shared!";

#[derive(Debug)]
pub struct SharePhoto {
    photo_id: i64,
    email: String,
    message: String,
    is_error: bool,
    sending: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    EmailChanged(String),
    Submit,
    Completed(Result<(), ApiError>),
}

impl SharePhoto {
    pub fn new(photo_id: i64) -> Self {
        SharePhoto {
            photo_id,
            email: String::new(),
            message: String::new(),
            is_error: false,
            sending: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn update(&mut self, message: Message, client: &ApiClient, token: &str) -> Task<Message> {
        match message {
            Message::EmailChanged(email) => self.email = email,
            Message::Submit => {
                if self.email.is_empty() {
                    self.message = EMPTY_EMAIL.to_string();
                    self.is_error = true;
                    return Task::none();
                }
                if self.sending {
                    return Task::none();
                }

                self.message.clear();
                self.is_error = false;
                self.sending = true;

                info!("🔗 Sharing photo {} with {}", self.photo_id, self.email);
                let client = client.clone();
                let token = token.to_string();
                let request = ShareRequest {
                    photo: self.photo_id,
                    shared_to: self.email.clone(),
                };
                return Task::perform(
                    async move { client.share_photo(&token, &request).await },
                    Message::Completed,
                );
            }
            Message::Completed(result) => {
                self.sending = false;
                match result {
                    Ok(()) => {
                        info!("✅ Shared photo {} with {}", self.photo_id, self.email);
                        self.message = SHARED.to_string();
                        self.is_error = false;
                        self.email.clear();
                    }
                    Err(e) => {
                        error!("Share error for photo {}: {}", self.photo_id, e);
                        self.message = share_error_message(&e);
                        self.is_error = true;
                    }
                }
            }
        }

        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let controls = row![
            text_input("User Email", &self.email)
                .on_input(Message::EmailChanged)
                .on_submit(Message::Submit)
                .padding(6)
                .size(14)
                .width(Length::Fill),
            button(text("Share").size(14))
                .on_press_maybe((!self.sending).then_some(Message::Submit))
                .padding(6),
        ]
        .spacing(6);

        let mut content = column![text("Share (Enter Email):").size(12), controls].spacing(4);

        if !self.message().is_empty() {
            let style = if self.is_error() { text::danger } else { text::success };
            content = content.push(text(self.message()).size(12).style(style));
        }

        content.into()
    }
}

/// Message for a failed share, most specific first:
/// recipient error, photo error, non-field error, plain string body,
/// `detail`, then a fallback chosen by status code.
pub fn share_error_message(err: &ApiError) -> String {
    match err.status() {
        Some(400) => {
            let body = err.body_json().unwrap_or(Value::Null);

            if let Some(field) = present(&body, "shared_to") {
                first_message(field).unwrap_or_else(|| "Validation error".to_string())
            } else if let Some(field) = present(&body, "photo") {
                first_message(field).unwrap_or_else(|| "Photo not found".to_string())
            } else if let Some(field) = present(&body, "non_field_errors") {
                first_message(field).unwrap_or_else(|| "Error".to_string())
            } else if let Value::String(raw) = &body {
                raw.clone()
            } else if let Some(Value::String(detail)) = present(&body, "detail") {
                detail.clone()
            } else {
                "Error sharing photo".to_string()
            }
        }
        Some(404) => "Photo or user not found".to_string(),
        Some(status) => format!("Error: {}", status),
        None => "Error: unknown".to_string(),
    }
}

/// Field of a JSON object, ignoring null and empty values
fn present<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        value => Some(value),
    }
}

/// First message of a field error, which the backend sends as a list
fn first_message(field: &Value) -> Option<String> {
    match field {
        Value::Array(items) => match items.first()? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
