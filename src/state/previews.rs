/// Preview handles for fetched photos
///
/// Every listed photo gets one fetch of its binary content. The bytes are
/// decoded off the UI thread into:
/// - a 256px thumbnail handle for the grid
/// - a full-size handle for the viewer
/// - the original bytes, kept for downloads
///
/// Live handles sit in a `PreviewRegistry`, separate from the list being
/// rendered, and are released on refresh, delete and teardown.
use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;
use iced::advanced::image::Bytes;
use iced::widget::image::Handle;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::{debug, warn};

use super::data::{LoadedPhoto, Photo};
use crate::api::ApiError;

/// Size of generated thumbnails (square bound)
pub const THUMBNAIL_SIZE: u32 = 256;

#[derive(Debug, Clone, Error)]
pub enum PreviewError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] ApiError),
    #[error("not a decodable image: {0}")]
    Decode(String),
}

/// Display handles for one photo
#[derive(Debug, Clone)]
pub struct Preview {
    pub thumbnail: Handle,
    pub full: Handle,
    /// Shared with `full`, so cloning never copies the file
    pub bytes: Bytes,
}

impl Preview {
    /// Decode fetched bytes into display handles.
    /// Runs on a blocking thread because decoding is CPU-bound.
    pub async fn decode(bytes: Vec<u8>) -> Result<Preview, PreviewError> {
        tokio::task::spawn_blocking(move || Preview::decode_blocking(bytes))
            .await
            .map_err(|e| PreviewError::Decode(format!("Task join error: {}", e)))?
    }

    /// Blocking version of preview decoding
    pub fn decode_blocking(bytes: Vec<u8>) -> Result<Preview, PreviewError> {
        let bytes = Bytes::from(bytes);
        let img = image::load_from_memory(&bytes)
            .map_err(|e| PreviewError::Decode(e.to_string()))?;

        let thumb = img
            .resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle)
            .to_rgba8();
        let (width, height) = thumb.dimensions();

        Ok(Preview {
            thumbnail: Handle::from_rgba(width, height, thumb.into_raw()),
            full: Handle::from_bytes(bytes.clone()),
            bytes,
        })
    }
}

/// Fetch previews for every photo concurrently.
///
/// A failing fetch only affects its own photo, which comes back without a
/// preview. The output always has one entry per input, in input order.
pub async fn fetch_previews<F, Fut>(photos: Vec<Photo>, fetch: F) -> Vec<LoadedPhoto>
where
    F: Fn(&Photo) -> Fut,
    Fut: Future<Output = Result<Preview, PreviewError>>,
{
    join_all(photos.into_iter().map(|photo| {
        let pending = fetch(&photo);
        async move {
            match pending.await {
                Ok(preview) => LoadedPhoto {
                    photo,
                    preview: Some(preview),
                },
                Err(e) => {
                    warn!(
                        "⚠️  Failed to load preview for {}: {}",
                        photo.file.as_deref().unwrap_or_default(),
                        e
                    );
                    LoadedPhoto {
                        photo,
                        preview: None,
                    }
                }
            }
        }
    }))
    .await
}

/// Owner of every live preview handle, keyed by photo id
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    previews: HashMap<i64, Preview>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a preview, releasing any older one for the same photo
    pub fn insert(&mut self, photo_id: i64, preview: Preview) {
        if self.previews.insert(photo_id, preview).is_some() {
            debug!("Replaced preview for photo {}", photo_id);
        }
    }

    pub fn get(&self, photo_id: i64) -> Option<&Preview> {
        self.previews.get(&photo_id)
    }

    pub fn contains(&self, photo_id: i64) -> bool {
        self.previews.contains_key(&photo_id)
    }

    /// Release one photo's handles. Returns false if none were held.
    pub fn release(&mut self, photo_id: i64) -> bool {
        self.previews.remove(&photo_id).is_some()
    }

    /// Release every handle, returning how many were held
    pub fn release_all(&mut self) -> usize {
        if self.is_empty() {
            return 0;
        }

        let released = self.len();
        self.previews.clear();
        debug!("🧹 Released {} preview handles", released);
        released
    }

    /// Number of live previews
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 100, 50, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn fake_preview() -> Preview {
        Preview {
            thumbnail: Handle::from_bytes(vec![1u8, 2, 3]),
            full: Handle::from_bytes(vec![1u8, 2, 3]),
            bytes: Bytes::from_static(&[1, 2, 3]),
        }
    }

    fn photo(id: i64) -> Photo {
        Photo {
            id,
            original_name: format!("{}.png", id),
            file: Some(format!("uploads/{}.png", id)),
            created_at: String::new(),
            is_owned: true,
        }
    }

    #[test]
    fn test_decode_keeps_original_bytes() {
        let bytes = png_bytes(600, 300);
        let preview = Preview::decode_blocking(bytes.clone()).unwrap();
        assert_eq!(preview.bytes.as_ref(), bytes.as_slice());
    }

    #[test]
    fn test_download_bytes_share_one_buffer() {
        let preview = Preview::decode_blocking(png_bytes(32, 32)).unwrap();
        let copy = preview.clone();
        assert_eq!(preview.bytes.as_ptr(), copy.bytes.as_ptr());
    }

    #[test]
    fn test_decode_rejects_non_images() {
        let err = Preview::decode_blocking(b"<html>404</html>".to_vec()).unwrap_err();
        assert!(matches!(err, PreviewError::Decode(_)));
    }

    #[test]
    fn test_one_failure_does_not_abort_batch() {
        let photos = vec![photo(1), photo(2), photo(3)];

        let loaded = block_on(fetch_previews(photos, |p| {
            let id = p.id;
            async move {
                if id == 2 {
                    Err(PreviewError::Fetch(ApiError::Status {
                        status: 404,
                        body: "missing".into(),
                    }))
                } else {
                    Ok(fake_preview())
                }
            }
        }));

        let ids: Vec<i64> = loaded.iter().map(|l| l.photo.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(loaded[0].preview.is_some());
        assert!(loaded[1].preview.is_none());
        assert!(loaded[2].preview.is_some());
    }

    #[test]
    fn test_each_photo_is_fetched_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let photos: Vec<Photo> = (1..=5).map(photo).collect();

        let loaded = block_on(fetch_previews(photos, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(fake_preview()) }
        }));

        assert_eq!(loaded.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_release_all_leaves_nothing_behind() {
        let mut registry = PreviewRegistry::new();
        for id in 1..=4 {
            registry.insert(id, fake_preview());
        }

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.release_all(), 4);
        assert!(registry.is_empty());
        assert_eq!(registry.release_all(), 0);
    }

    #[test]
    fn test_release_single_photo() {
        let mut registry = PreviewRegistry::new();
        registry.insert(7, fake_preview());
        registry.insert(8, fake_preview());

        assert!(registry.release(7));
        assert!(!registry.release(7));
        assert!(!registry.contains(7));
        assert!(registry.contains(8));
    }

    #[test]
    fn test_insert_replaces_existing_handle() {
        let mut registry = PreviewRegistry::new();
        registry.insert(1, fake_preview());
        registry.insert(1, fake_preview());
        assert_eq!(registry.len(), 1);
    }
}
