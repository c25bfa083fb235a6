//! S3 object store
//!
//! Works against AWS S3 and S3-compatible storage (MinIO, LocalStack) when
//! an endpoint override is given.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use secretstash_core::{Error, Result};
use tracing::debug;

use crate::storage::{ObjectLocation, ObjectStore};

pub struct S3ObjectStore {
    client: Client,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    /// Build a client from an already-resolved AWS configuration
    pub fn new(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(endpoint_url) = endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            // path-style addressing is required by MinIO and most S3 clones
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            endpoint: endpoint.map(String::from),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        debug!(location = %location, "Downloading object");

        let response = match self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(Error::object_not_found(&location.bucket, &location.key));
                }
                return Err(Error::transport(
                    format!("s3:GetObject {}", location),
                    DisplayErrorContext(&service_error),
                ));
            }
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::transport(format!("s3:GetObject {}", location), e))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        tags: &[(String, String)],
    ) -> Result<()> {
        debug!(location = %location, bytes = body.len(), "Uploading object");

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(ByteStream::from(body))
            .set_tagging(encode_tags(tags))
            .send()
            .await
            .map_err(|e| {
                Error::transport(format!("s3:PutObject {}", location), DisplayErrorContext(&e))
            })?;

        Ok(())
    }
}

/// URL-encoded `k1=v1&k2=v2` tag set, or `None` when there are no tags
fn encode_tags(tags: &[(String, String)]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in tags {
        serializer.append_pair(key, value);
    }
    Some(serializer.finish())
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("region", &self.client.config().region())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
