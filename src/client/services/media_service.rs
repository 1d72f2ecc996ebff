use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;
use serde_json::{json, Value};

use crate::client::services::gateway::{Ack, Gateway};
use crate::client::services::transport::Transport;
use crate::common::error::{ClientError, Result};
use crate::common::models::StoryVisibility;

/// Bucket folder an upload lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Avatars,
    Posts,
    Stories,
}

impl MediaFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFolder::Avatars => "avatars",
            MediaFolder::Posts => "posts",
            MediaFolder::Stories => "stories",
        }
    }
}

/// An image or clip read from disk, ready to upload
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MediaFile {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            bytes: std::fs::read(path)?,
            mime_type: guess_mime(path).to_string(),
        })
    }
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        _ => "image/jpeg",
    }
}

/// Uploads files and publishes the records that point at them
pub struct MediaService {
    uploads: Arc<dyn Transport>,
    gateway: Gateway,
}

impl MediaService {
    pub fn new(uploads: Arc<dyn Transport>, gateway: Gateway) -> Self {
        Self { uploads, gateway }
    }

    /// Sends the file base64-encoded and returns its public URL
    pub async fn upload(&self, file: &MediaFile, folder: MediaFolder) -> Result<String> {
        let body = json!({
            "file": STANDARD.encode(&file.bytes),
            "type": file.mime_type,
            "folder": folder.as_str(),
        });
        let value = self.uploads.post(body).await?;
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Server {
                status: 200,
                message: "upload answered without a url".to_string(),
            })?;
        info!("[MEDIA] uploaded {} bytes to {}", file.bytes.len(), folder.as_str());
        Ok(url.to_string())
    }

    /// Creates a post; returns `None` when there is nothing to publish
    pub async fn publish_post(&self, content: &str, image: Option<&MediaFile>) -> Result<Option<Ack>> {
        let content = content.trim();
        if content.is_empty() && image.is_none() {
            return Ok(None);
        }
        let image_url = match image {
            Some(file) => Some(self.upload(file, MediaFolder::Posts).await?),
            None => None,
        };
        let ack = self.gateway.create_post(content, image_url.as_deref()).await?;
        Ok(Some(ack))
    }

    pub async fn publish_story(&self, file: &MediaFile, visibility: StoryVisibility) -> Result<Ack> {
        let url = self.upload(file, MediaFolder::Stories).await?;
        self.gateway.create_story(&url, visibility).await
    }

    pub async fn set_avatar(&self, file: &MediaFile) -> Result<Ack> {
        let url = self.upload(file, MediaFolder::Avatars).await?;
        self.gateway.upload_avatar(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;

    fn service() -> (Arc<FakeTransport>, Arc<FakeTransport>, MediaService) {
        let uploads = FakeTransport::new();
        let api = FakeTransport::new();
        uploads.respond("upload", json!({"url": "https://cdn/x.png"}));
        let media = MediaService::new(uploads.clone(), Gateway::new(api.clone()));
        (uploads, api, media)
    }

    fn png() -> MediaFile {
        MediaFile {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn story_uploads_then_creates_record() {
        let (uploads, api, media) = service();
        media.publish_story(&png(), StoryVisibility::Mutual).await.unwrap();

        let sent = &uploads.calls()[0].payload;
        assert_eq!(sent["file"], "AQID");
        assert_eq!(sent["folder"], "stories");
        assert_eq!(
            api.calls()[0].payload,
            json!({"action": "create_story", "image_url": "https://cdn/x.png", "visibility": "mutual"})
        );
    }

    #[tokio::test]
    async fn empty_post_is_not_sent() {
        let (uploads, api, media) = service();
        assert!(media.publish_post("   ", None).await.unwrap().is_none());
        assert!(uploads.calls().is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_without_url_is_an_error() {
        let (uploads, _api, media) = service();
        uploads.respond("upload", json!({"ok": true}));
        assert!(media.set_avatar(&png()).await.is_err());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(guess_mime(Path::new("a.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_mime(Path::new("noext")), "image/jpeg");
    }
}
