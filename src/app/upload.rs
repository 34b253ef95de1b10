use anyhow::Result;
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use crate::infra::storage::VideoStore;

/// An uploaded file held fully in memory.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Moves an uploaded video into object storage under a fresh random key.
#[derive(Clone)]
pub struct UploadRelay {
    store: Arc<dyn VideoStore>,
    key_prefix: String,
}

impl UploadRelay {
    pub fn new(store: Arc<dyn VideoStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Returns the public URL of the stored object.
    pub async fn relay(&self, upload: VideoUpload) -> Result<String> {
        let ext = extension_for(upload.file_name.as_deref(), &upload.content_type);
        let object_key = format!(
            "{}/{}.{}",
            self.key_prefix.trim_matches('/'),
            Uuid::new_v4(),
            ext
        );

        self.store
            .put_new(&object_key, upload.bytes, &upload.content_type)
            .await?;
        let public_url = self.store.public_url(&object_key)?;

        tracing::info!(object_key = %object_key, "stored review video");

        Ok(public_url)
    }
}

/// Extension from the original file name, else from the MIME type.
pub fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }

    let essence = content_type.split(';').next().unwrap_or("").trim();
    mime_guess::get_mime_extensions_str(essence)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "bin".to_string())
}
