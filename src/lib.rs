pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::config::AdminAuthMode;
use crate::infra::{db::ReviewStore, storage::VideoStore};

#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<dyn ReviewStore>,
    pub videos: Arc<dyn VideoStore>,
    pub video_key_prefix: String,
    pub upload_max_bytes: u64,
    pub allowed_video_types: Arc<Vec<String>>,
    pub admin_auth: AdminAuthMode,
    pub admin_token: Option<String>,
}
