use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{BucketError, BucketStore, ObjectSummary, S3Config};

/// Stage datasets kept in a single S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3BucketStore {
    client: Client,
    bucket: String,
}

impl S3BucketStore {
    pub async fn new(config: S3Config) -> Result<Self, BucketError> {
        if config.bucket.trim().is_empty() {
            return Err(BucketError::Configuration(
                "ADPIPE_BUCKET must name a bucket".into(),
            ));
        }

        let client = build_client(&config).await;
        debug!(bucket = %config.bucket, region = %config.region, "s3 store ready");
        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }
}

async fn build_client(config: &S3Config) -> Client {
    let mut shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));
    if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
        let static_keys = Credentials::new(key_id, secret, None, None, "adpipe-env");
        shared = shared.credentials_provider(SharedCredentialsProvider::new(static_keys));
    }

    let mut s3 = aws_sdk_s3::config::Builder::from(&shared.load().await)
        .force_path_style(config.force_path_style);
    if let Some(endpoint) = &config.endpoint {
        s3 = s3.endpoint_url(endpoint);
    }
    Client::from_conf(s3.build())
}

fn to_summary(object: &Object) -> Option<ObjectSummary> {
    let key = object.key()?;
    let last_modified = object
        .last_modified()
        .and_then(to_utc)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Some(ObjectSummary {
        key: key.to_string(),
        last_modified,
    })
}

fn to_utc(stamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(stamp.secs(), stamp.subsec_nanos())
}

#[async_trait]
impl BucketStore for S3BucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(BucketError::from_sdk)?;
        debug!(key, "uploaded object");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(SdkError::ServiceError(failure)) if failure.err().is_no_such_key() => {
                return Err(BucketError::NotFound(key.to_string()));
            }
            Err(other) => return Err(BucketError::from_sdk(other)),
        };

        let body = output.body.collect().await.map_err(BucketError::from_sdk)?;
        Ok(body.into_bytes())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, BucketError> {
        let mut summaries = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(BucketError::from_sdk)?;

            summaries.extend(page.contents().iter().filter_map(to_summary));

            match page.next_continuation_token() {
                Some(next) if page.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => break,
            }
        }

        debug!(prefix, objects = summaries.len(), "listed objects");
        Ok(summaries)
    }
}
