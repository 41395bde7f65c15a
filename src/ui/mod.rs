/// User interface module
///
/// Each screen owns its state, a `Message` enum and `update`/`view`
/// functions. Screens report back to the root application through an
/// `Event` when something outside their own state has to change.
///
/// - `login.rs` / `register.rs` - authentication screens
/// - `upload.rs` - single-file upload panel
/// - `photos.rs` - owned and shared photo listing
/// - `share.rs` - share one photo by email
use iced::widget::{button, row, text, text_input};
use iced::{Alignment, Element, Length};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

pub mod login;
pub mod photos;
pub mod register;
pub mod share;
pub mod upload;

/// Width of the login/register forms
pub const FORM_WIDTH: f32 = 360.0;

/// Blocking informational dialog
pub fn alert(description: impl Into<String>) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("Photo Share")
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Blocking Yes/No dialog, true when the user picked Yes
pub fn confirm(description: impl Into<String>) -> bool {
    let result = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Photo Share")
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show();

    matches!(result, MessageDialogResult::Yes)
}

/// Password input with a show/hide toggle next to it
pub fn password_field<'a, M: Clone + 'a>(
    placeholder: &str,
    value: &str,
    visible: bool,
    on_input: impl Fn(String) -> M + 'a,
    on_toggle: M,
) -> Element<'a, M> {
    let input = text_input(placeholder, value)
        .on_input(on_input)
        .secure(!visible)
        .padding(10)
        .width(Length::Fill);

    let toggle = button(text(if visible { "Hide" } else { "Show" }).size(14))
        .on_press(on_toggle)
        .style(button::text);

    row![input, toggle]
        .spacing(6)
        .align_y(Alignment::Center)
        .into()
}

/// Inline error line shown above a form
pub fn error_text<'a, M: 'a>(message: &'a str) -> Element<'a, M> {
    text(format!("⚠ {}", message))
        .size(14)
        .style(text::danger)
        .into()
}
