/// Photo listing: owned photos and photos shared with the user
///
/// Loading happens in two steps. The photo index is fetched first, then
/// every photo with a file gets one concurrent preview fetch. The list is
/// only updated once all preview fetches have finished.
///
/// A list is created with a generation number. Results tagged with any
/// other generation belong to a list that has been replaced and are
/// dropped, handles included.
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use iced::widget::image::Handle;
use iced::widget::{
    button, column, container, horizontal_space, row, scrollable, text, Column, Image, Row,
};
use iced::{Alignment, ContentFit, Element, Length, Task};
use rfd::FileDialog;
use tracing::{error, info, warn};

use super::share::{self, SharePhoto};
use super::{alert, confirm};
use crate::api::{ApiClient, ApiError};
use crate::state::data::{partition, LoadedPhoto, Photo};
use crate::state::previews::{
    fetch_previews, Preview, PreviewError, PreviewRegistry, THUMBNAIL_SIZE,
};

pub const DELETED: &str = "Photo successfully deleted";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log out and log in again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

pub struct PhotosList {
    client: ApiClient,
    token: String,
    generation: u64,
    state: LoadState,
    photos: Vec<Photo>,
    /// Live handles, kept apart from the rendered list
    previews: PreviewRegistry,
    shares: HashMap<i64, SharePhoto>,
    /// Set while a delete is in flight; disables every action
    busy: bool,
    viewing: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Loaded(u64, Result<Vec<LoadedPhoto>, ApiError>),
    Retry,
    View(i64),
    CloseViewer,
    Download(i64),
    Downloaded(Result<PathBuf, ApiError>),
    Delete(i64),
    Deleted(i64, Result<(), ApiError>),
    Share(i64, share::Message),
}

impl PhotosList {
    /// Create the list and start fetching it
    pub fn new(client: ApiClient, token: String, generation: u64) -> (Self, Task<Message>) {
        let list = PhotosList {
            client,
            token,
            generation,
            state: LoadState::Loading,
            photos: Vec::new(),
            previews: PreviewRegistry::new(),
            shares: HashMap::new(),
            busy: false,
            viewing: None,
        };
        let task = list.load();
        (list, task)
    }

    fn load(&self) -> Task<Message> {
        let generation = self.generation;
        Task::perform(
            load_photos(self.client.clone(), self.token.clone()),
            move |result| Message::Loaded(generation, result),
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Release every handle this list holds
    pub fn teardown(&mut self) -> usize {
        self.viewing = None;
        self.previews.release_all()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Loaded(generation, result) => {
                if generation != self.generation {
                    warn!(
                        "Dropping stale photo list (generation {}, current {})",
                        generation, self.generation
                    );
                    return Task::none();
                }
                self.apply_loaded(result);
            }
            Message::Retry => {
                self.teardown();
                self.state = LoadState::Loading;
                return self.load();
            }
            Message::View(id) => {
                if self.previews.contains(id) {
                    self.viewing = Some(id);
                }
            }
            Message::CloseViewer => self.viewing = None,
            Message::Download(id) => return self.download(id),
            Message::Downloaded(result) => match result {
                Ok(path) => info!("💾 Saved {}", path.display()),
                Err(e) => {
                    error!("Download failed: {}", e);
                    alert(format!("Error saving photo: {}", e));
                }
            },
            Message::Delete(id) => return self.delete(id),
            Message::Deleted(id, result) => alert(self.on_deleted(id, result)),
            Message::Share(id, message) => {
                if let Some(share) = self.shares.get_mut(&id) {
                    return share
                        .update(message, &self.client, &self.token)
                        .map(move |m| Message::Share(id, m));
                }
            }
        }

        Task::none()
    }

    /// Swap in a freshly loaded list, releasing whatever was shown before
    fn apply_loaded(&mut self, result: Result<Vec<LoadedPhoto>, ApiError>) {
        self.teardown();
        self.shares.clear();

        match result {
            Ok(loaded) => {
                self.photos = Vec::with_capacity(loaded.len());
                for LoadedPhoto { photo, preview } in loaded {
                    if let Some(preview) = preview {
                        self.previews.insert(photo.id, preview);
                    }
                    if photo.is_owned {
                        self.shares.insert(photo.id, SharePhoto::new(photo.id));
                    }
                    self.photos.push(photo);
                }
                self.state = LoadState::Loaded;
                info!(
                    "Showing {} photos, {} with previews",
                    self.photos.len(),
                    self.previews.len()
                );
            }
            Err(e) => {
                error!("Failed to load photos: {}", e);
                self.photos.clear();
                self.state = LoadState::Failed(load_error_message(&e));
            }
        }
    }

    /// Settle a finished delete, returning the text to alert.
    /// A failure leaves the list and its previews untouched.
    fn on_deleted(&mut self, id: i64, result: Result<(), ApiError>) -> String {
        self.busy = false;
        match result {
            Ok(()) => {
                info!("🗑️  Deleted photo ID {}", id);
                self.remove_photo(id);
                DELETED.to_string()
            }
            Err(e) => {
                error!("Delete error for photo {}: {}", id, e);
                delete_error_message(&e)
            }
        }
    }

    /// Drop exactly one photo from local state
    fn remove_photo(&mut self, id: i64) {
        self.photos.retain(|p| p.id != id);
        self.previews.release(id);
        self.shares.remove(&id);
        if self.viewing == Some(id) {
            self.viewing = None;
        }
    }

    fn download(&self, id: i64) -> Task<Message> {
        let (Some(photo), Some(preview)) = (self.find(id), self.previews.get(id)) else {
            return Task::none();
        };

        let target = FileDialog::new()
            .set_title("Save photo")
            .set_file_name(&photo.original_name)
            .save_file();

        let Some(path) = target else {
            return Task::none();
        };

        let bytes = preview.bytes.clone();
        Task::perform(
            async move {
                tokio::fs::write(&path, bytes).await?;
                Ok::<PathBuf, ApiError>(path)
            },
            Message::Downloaded,
        )
    }

    fn delete(&mut self, id: i64) -> Task<Message> {
        let Some(photo) = self.find(id) else {
            return Task::none();
        };
        if self.busy || !photo.is_owned {
            return Task::none();
        }

        if !confirm(format!("Are you sure you want to delete \"{}\"?", photo.original_name)) {
            return Task::none();
        }

        info!("Deleting photo ID {}", id);
        self.busy = true;
        let client = self.client.clone();
        let token = self.token.clone();
        Task::perform(
            async move { client.delete_photo(&token, id).await },
            move |result| Message::Deleted(id, result),
        )
    }

    fn find(&self, id: i64) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn view(&self) -> Element<'_, Message> {
        if let Some(preview) = self.viewing.and_then(|id| self.previews.get(id)) {
            return self.viewer(preview);
        }

        let body: Element<Message> = match &self.state {
            LoadState::Loading => text("Loading photos...").style(text::secondary).into(),
            LoadState::Failed(message) => column![
                text(message.as_str()).style(text::danger),
                button(text("Retry")).on_press(Message::Retry).padding(8),
            ]
            .spacing(10)
            .into(),
            LoadState::Loaded => self.sections(),
        };

        scrollable(column![text("My Photos").size(28), body].spacing(16).padding(4))
            .height(Length::Fill)
            .into()
    }

    fn sections(&self) -> Element<'_, Message> {
        let (owned, shared) = partition(&self.photos);
        let mut content: Column<Message> = Column::new().spacing(16);

        if owned.is_empty() {
            content = content.push(text("No photos uploaded").style(text::secondary));
        } else {
            content = content.push(self.grid(owned));
        }

        // Section is left out entirely when nothing is shared
        if !shared.is_empty() {
            content = content
                .push(text("Shared with Me").size(28))
                .push(self.grid(shared));
        }

        content.into()
    }

    fn grid<'a>(&'a self, photos: Vec<&'a Photo>) -> Element<'a, Message> {
        let cards = photos.into_iter().map(|photo| self.card(photo));

        Row::with_children(cards)
            .spacing(16)
            .wrap()
            .into()
    }

    fn card<'a>(&'a self, photo: &'a Photo) -> Element<'a, Message> {
        let size = THUMBNAIL_SIZE as f32;
        let preview = self.previews.get(photo.id);

        let picture: Element<Message> = match preview {
            Some(preview) => Image::<Handle>::new(preview.thumbnail.clone())
                .width(size)
                .height(size)
                .content_fit(ContentFit::Contain)
                .into(),
            None => container(text("No preview").size(12))
                .width(size)
                .height(size)
                .center_x(size)
                .center_y(size)
                .into(),
        };

        let mut info = column![
            text(photo.original_name.as_str()).size(15),
            text(photo.uploaded_at()).size(12).style(text::secondary),
        ]
        .spacing(4);

        if preview.is_some() {
            let action = |label: &'a str, message: Message| {
                button(text(label).size(13))
                    .on_press_maybe((!self.busy).then_some(message))
                    .padding([4, 8])
            };

            let mut actions = row![
                action("View", Message::View(photo.id)).style(button::secondary),
                action("Download", Message::Download(photo.id)).style(button::secondary),
            ]
            .spacing(6);

            if photo.is_owned {
                actions = actions
                    .push(action("Delete", Message::Delete(photo.id)).style(button::danger));
            }
            info = info.push(actions);
        }

        let mut card = column![picture, info].spacing(8).width(size);

        if let Some(share) = self.shares.get(&photo.id) {
            let id = photo.id;
            card = card.push(share.view().map(move |m| Message::Share(id, m)));
        }

        container(card)
            .padding(10)
            .style(container::rounded_box)
            .into()
    }

    fn viewer<'a>(&'a self, preview: &'a Preview) -> Element<'a, Message> {
        let name = self
            .viewing
            .and_then(|id| self.find(id))
            .map(|photo| photo.original_name.as_str())
            .unwrap_or_default();

        column![
            row![
                text(name).size(20),
                horizontal_space(),
                button(text("Close")).on_press(Message::CloseViewer).padding(8),
            ]
            .align_y(Alignment::Center),
            Image::<Handle>::new(preview.full.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Contain),
        ]
        .spacing(12)
        .into()
    }
}

impl Drop for PhotosList {
    fn drop(&mut self) {
        let released = self.teardown();
        if released > 0 {
            info!("🧹 Photo list {} released {} previews", self.generation, released);
        }
    }
}

/// Fetch the photo index and every preview.
///
/// Photos without a file reference are dropped before any preview fetch.
pub async fn load_photos(
    client: ApiClient,
    token: String,
) -> Result<Vec<LoadedPhoto>, ApiError> {
    let photos = client.list_photos(&token).await?;

    let loaded = load_from(photos, |photo| {
        let client = client.clone();
        let token = token.clone();
        let file = photo.file.clone().unwrap_or_default();
        async move {
            let bytes = client.fetch_media(&token, &file).await?;
            Preview::decode(bytes).await
        }
    })
    .await;

    Ok(loaded)
}

/// Drop photos without a file, then fetch a preview for each of the rest
async fn load_from<F, Fut>(photos: Vec<Photo>, fetch: F) -> Vec<LoadedPhoto>
where
    F: Fn(&Photo) -> Fut,
    Fut: Future<Output = Result<Preview, PreviewError>>,
{
    let total = photos.len();
    let with_files: Vec<Photo> = photos.into_iter().filter(Photo::has_file).collect();
    info!("📷 Loaded {} photos, {} have files", total, with_files.len());

    fetch_previews(with_files, fetch).await
}

/// Inline message when the index itself cannot be fetched
pub fn load_error_message(err: &ApiError) -> String {
    match err.status() {
        Some(401) | Some(403) => SESSION_EXPIRED.to_string(),
        Some(status) => format!("Could not load photos (error {})", status),
        None => "Could not load photos. Check your connection.".to_string(),
    }
}

/// Alert text for a failed delete
pub fn delete_error_message(err: &ApiError) -> String {
    match err.status_summary() {
        Some(summary) => format!("Error deleting photo: {}", summary),
        None => format!("Error deleting photo: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use futures::executor::block_on;
    use std::sync::Mutex;

    fn client() -> ApiClient {
        ApiClient::new(&Config::new("http://localhost:8000/api", PathBuf::from("/tmp")).unwrap())
            .unwrap()
    }

    fn fake_preview() -> Preview {
        Preview {
            thumbnail: Handle::from_bytes(vec![0u8; 4]),
            full: Handle::from_bytes(vec![0u8; 4]),
            bytes: vec![0u8; 4].into(),
        }
    }

    fn loaded(id: i64, name: &str, is_owned: bool, with_preview: bool) -> LoadedPhoto {
        LoadedPhoto {
            photo: Photo {
                id,
                original_name: name.into(),
                file: Some(format!("uploads/{}", name)),
                created_at: "2024-05-01T10:30:00Z".into(),
                is_owned,
            },
            preview: with_preview.then(fake_preview),
        }
    }

    fn sample() -> Vec<LoadedPhoto> {
        vec![
            loaded(5, "dog.png", true, true),
            loaded(7, "cat.png", true, true),
            loaded(9, "bird.png", false, true),
            loaded(11, "fish.png", false, false),
        ]
    }

    fn list_with(generation: u64, photos: Vec<LoadedPhoto>) -> PhotosList {
        let (mut list, _) = PhotosList::new(client(), "tok".into(), generation);
        let _ = list.update(Message::Loaded(generation, Ok(photos)));
        list
    }

    #[test]
    fn test_loaded_list_tracks_previews() {
        let list = list_with(1, sample());
        assert_eq!(&list.state, &LoadState::Loaded);
        assert_eq!(list.photos.len(), 4);
        assert_eq!(list.previews.len(), 3);
        // Only owned photos get a share panel
        assert_eq!(list.shares.len(), 2);
        assert!(list.shares.contains_key(&5) && list.shares.contains_key(&7));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut list = list_with(2, sample());
        let _ = list.update(Message::Loaded(1, Ok(vec![loaded(99, "old.png", true, true)])));

        assert_eq!(list.photos.len(), 4);
        assert!(list.find(99).is_none());
        assert_eq!(list.previews.len(), 3);
    }

    #[test]
    fn test_reload_releases_previous_handles() {
        let mut list = list_with(1, sample());
        let _ = list.update(Message::Loaded(1, Ok(vec![loaded(1, "new.png", true, true)])));

        assert_eq!(list.photos.len(), 1);
        assert_eq!(list.previews.len(), 1);
        assert!(!list.previews.contains(7));
    }

    #[test]
    fn test_teardown_releases_every_handle() {
        let mut list = list_with(1, sample());
        assert_eq!(list.teardown(), 3);
        assert_eq!(list.previews.len(), 0);
    }

    #[test]
    fn test_delete_success_removes_only_that_photo() {
        let mut list = list_with(1, sample());
        list.busy = true;

        let notice = list.on_deleted(7, Ok(()));
        assert_eq!(notice, DELETED);
        assert!(!list.busy);

        let ids: Vec<i64> = list.photos.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 9, 11]);
        assert!(!list.previews.contains(7));
        assert!(list.previews.contains(5));
        assert!(!list.shares.contains_key(&7));
        assert_eq!(list.previews.len(), 2);
    }

    #[test]
    fn test_delete_failure_keeps_list_intact() {
        let mut list = list_with(1, sample());
        list.busy = true;

        let err = ApiError::Status {
            status: 403,
            body: "forbidden".into(),
        };
        let notice = list.on_deleted(7, Err(err));
        assert_eq!(notice, "Error deleting photo: 403 - forbidden");
        assert!(!list.busy);

        let ids: Vec<i64> = list.photos.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 7, 9, 11]);
        assert!(list.previews.contains(7));
        assert_eq!(list.previews.len(), 3);
        assert!(list.shares.contains_key(&7));
    }

    #[test]
    fn test_photos_without_file_are_never_fetched() {
        let photo = |id: i64, file: Option<&str>| Photo {
            id,
            original_name: format!("{}.png", id),
            file: file.map(String::from),
            created_at: String::new(),
            is_owned: true,
        };
        let photos = vec![
            photo(1, Some("uploads/1.png")),
            photo(2, None),
            photo(3, Some("")),
            photo(4, Some("  ")),
            photo(5, Some("uploads/5.png")),
        ];

        let fetched = Mutex::new(Vec::new());
        let loaded = block_on(load_from(photos, |p| {
            fetched.lock().unwrap().push(p.id);
            async { Ok(fake_preview()) }
        }));

        let ids: Vec<i64> = loaded.iter().map(|l| l.photo.id).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(*fetched.lock().unwrap(), vec![1, 5]);
    }

    #[test]
    fn test_view_requires_a_preview() {
        let mut list = list_with(1, sample());
        let _ = list.update(Message::View(11));
        assert_eq!(list.viewing, None);

        let _ = list.update(Message::View(9));
        assert_eq!(list.viewing, Some(9));

        let _ = list.update(Message::CloseViewer);
        assert_eq!(list.viewing, None);
    }

    #[test]
    fn test_deleting_shared_photo_is_ignored() {
        let mut list = list_with(1, sample());
        let _ = list.update(Message::Delete(9));
        assert!(!list.busy);
        assert_eq!(list.photos.len(), 4);
    }

    #[test]
    fn test_index_failure_is_reported_inline() {
        let (mut list, _) = PhotosList::new(client(), "tok".into(), 3);
        let _ = list.update(Message::Loaded(
            3,
            Err(ApiError::Status {
                status: 401,
                body: String::new(),
            }),
        ));

        assert!(matches!(&list.state, LoadState::Failed(_)));
        assert!(list.photos.is_empty());
    }

    #[test]
    fn test_share_messages_are_routed_by_photo() {
        let mut list = list_with(1, sample());
        let _ = list.update(Message::Share(7, share::Message::Submit));

        assert_eq!(list.shares[&7].message(), share::EMPTY_EMAIL);
        assert!(list.shares[&5].message().is_empty());
    }

    #[test]
    fn test_delete_error_message() {
        let err = ApiError::Status {
            status: 404,
            body: r#"{"detail":"Not found."}"#.into(),
        };
        assert_eq!(
            delete_error_message(&err),
            r#"Error deleting photo: 404 - {"detail":"Not found."}"#
        );
    }
}
