use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use url::Url;

use crate::config::AppConfig;

/// Object storage for uploaded review videos.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Stores `body` under `key`. Fails if the key already exists.
    async fn put_new(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Publicly resolvable address of `key`.
    fn public_url(&self, key: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base: Url,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(config.s3_endpoint.clone())
            .force_path_style(true);
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let s3_config = s3_builder.build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
            public_base: Url::parse(&config.s3_public_base_url)?,
        })
    }
}

#[async_trait]
impl VideoStore for ObjectStorage {
    async fn put_new(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .if_none_match("*")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| anyhow!("put_object {} failed: {}", key, err))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String> {
        public_object_url(&self.public_base, key)
    }
}

/// Appends the key's path segments to the public base, escaping each one.
pub fn public_object_url(base: &Url, key: &str) -> Result<String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("public base url cannot carry a path: {}", base))?
        .pop_if_empty()
        .extend(key.split('/').filter(|segment| !segment.is_empty()));
    Ok(url.to_string())
}
