/// Upload panel: pick one file, send it, ask the list to refresh
use iced::widget::{button, column, text};
use iced::{Element, Length, Task};
use rfd::FileDialog;
use std::path::PathBuf;
use tracing::{error, info};

use super::alert;
use crate::api::{ApiClient, ApiError};

/// Offered first in the picker; "All files" stays available
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "heic"];

#[derive(Debug, Default)]
pub struct Upload {
    file: Option<PathBuf>,
    loading: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    PickFile,
    Submit,
    Completed(Result<(), ApiError>),
}

/// Events propagated to the parent application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    None,
    Uploaded,
}

impl Upload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, path: PathBuf) {
        self.file = Some(path);
    }

    /// Upload is only possible with a file and nothing in flight
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && !self.loading
    }

    pub fn update(
        &mut self,
        message: Message,
        client: &ApiClient,
        token: &str,
    ) -> (Task<Message>, Event) {
        match message {
            Message::PickFile => {
                if self.loading {
                    return (Task::none(), Event::None);
                }

                let picked = FileDialog::new()
                    .set_title("Select a photo to upload")
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .add_filter("All files", &["*"])
                    .pick_file();

                if let Some(path) = picked {
                    self.select(path);
                }
            }
            Message::Submit => {
                if !self.can_submit() {
                    return (Task::none(), Event::None);
                }
                let Some(path) = self.file.clone() else {
                    return (Task::none(), Event::None);
                };

                self.loading = true;
                let client = client.clone();
                let token = token.to_string();
                let task = Task::perform(
                    async move { client.upload_photo(&token, &path).await },
                    Message::Completed,
                );
                return (task, Event::None);
            }
            Message::Completed(result) => {
                self.loading = false;
                match result {
                    Ok(()) => {
                        info!("✅ Upload complete");
                        alert("Photo uploaded successfully");
                        self.file = None;
                        return (Task::none(), Event::Uploaded);
                    }
                    Err(e) => {
                        error!("Upload error: {}", e);
                        alert(upload_error_message(&e));
                    }
                }
            }
        }

        (Task::none(), Event::None)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut content = column![
            text("Upload Photo").size(24),
            button(text("Choose photo..."))
                .on_press_maybe((!self.loading).then_some(Message::PickFile))
                .style(button::secondary)
                .padding(8),
        ]
        .spacing(12)
        .width(Length::Fill);

        if let Some(name) = self.file.as_ref().and_then(|path| path.file_name()) {
            content = content.push(
                text(format!("✓ {}", name.to_string_lossy()))
                    .size(14)
                    .style(text::secondary),
            );
        }

        content
            .push(
                button(text(if self.loading { "Uploading..." } else { "Upload" }))
                    .on_press_maybe(self.can_submit().then_some(Message::Submit))
                    .padding(10)
                    .width(Length::Fill),
            )
            .into()
    }
}

/// Alert text for a failed upload
pub fn upload_error_message(err: &ApiError) -> String {
    match err.status_summary() {
        Some(summary) => format!("Upload error: {}", summary),
        None => "Upload error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client() -> ApiClient {
        ApiClient::new(&Config::new("http://localhost:8000/api", PathBuf::from("/tmp")).unwrap())
            .unwrap()
    }

    #[test]
    fn test_nothing_selected_cannot_submit() {
        let mut upload = Upload::new();
        assert!(!upload.can_submit());

        let (_, event) = upload.update(Message::Submit, &client(), "tok");
        assert_eq!(event, Event::None);
        assert!(!upload.loading);
    }

    #[test]
    fn test_submit_with_file_sets_loading() {
        let mut upload = Upload::new();
        upload.select(PathBuf::from("/photos/cat.png"));
        assert!(upload.can_submit());

        let (_, event) = upload.update(Message::Submit, &client(), "tok");
        assert_eq!(event, Event::None);
        assert!(upload.loading);
        assert!(!upload.can_submit());
    }

    #[test]
    fn test_error_messages() {
        let status = ApiError::Status {
            status: 413,
            body: "Request Entity Too Large".into(),
        };
        assert_eq!(
            upload_error_message(&status),
            "Upload error: 413 - Request Entity Too Large"
        );
        assert_eq!(
            upload_error_message(&ApiError::Network("refused".into())),
            "Upload error"
        );
    }
}
