//! Path-style S3 reader/writer
//!
//! Resolves `s3://bucket/key` URIs against a configured endpoint using
//! path-style addressing and SigV4 signing. When a workspace access point is
//! set it overrides the bucket named in the URI. Non-`s3://` URIs fall back
//! to a plain HTTP GET or a filesystem read.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::sigv4::{sign_request, uri_encode_path};
use super::{StorageError, StorageIo};
use crate::config::StorageCredentials;

/// A bucket/key pair parsed from an `s3://` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    pub fn parse(uri: &str) -> Result<Self, StorageError> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| StorageError::InvalidUri(uri.to_string()))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidUri(uri.to_string()))?;
        if bucket.is_empty() || key.is_empty() {
            return Err(StorageError::InvalidUri(uri.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

/// S3-backed [`StorageIo`] built from resolved stage-out credentials
#[derive(Debug, Clone)]
pub struct S3StorageIo {
    client: reqwest::Client,
    credentials: StorageCredentials,
    access_point: Option<String>,
}

impl S3StorageIo {
    pub fn new(credentials: StorageCredentials, access_point: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            access_point,
        }
    }

    fn bucket_for(&self, location: &S3Location) -> String {
        self.access_point
            .clone()
            .unwrap_or_else(|| location.bucket.clone())
    }

    fn endpoint_host(&self) -> String {
        let endpoint = &self.credentials.endpoint;
        endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string()
    }

    fn object_url(&self, bucket: &str, key: &str) -> (String, String) {
        let canonical_uri = uri_encode_path(&format!("/{}/{}", bucket, key));
        let url = format!(
            "{}{}",
            self.credentials.endpoint.trim_end_matches('/'),
            canonical_uri
        );
        (url, canonical_uri)
    }

    async fn get_object(&self, location: &S3Location) -> Result<String, StorageError> {
        let bucket = self.bucket_for(location);
        info!("Reading object in bucket {} at {}", bucket, location.key);

        let (url, canonical_uri) = self.object_url(&bucket, &location.key);
        let signed = sign_request(
            "GET",
            &self.endpoint_host(),
            &canonical_uri,
            b"",
            Utc::now(),
            &self.credentials,
        );

        let response = self
            .client
            .get(&url)
            .header("authorization", &signed.authorization)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.content_sha256)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StorageError::Status { status, uri: url });
        }
        Ok(response.text().await?)
    }

    async fn put_object(&self, location: &S3Location, body: &str) -> Result<(), StorageError> {
        let bucket = self.bucket_for(location);
        info!("Writing object in bucket {} at {}", bucket, location.key);

        let (url, canonical_uri) = self.object_url(&bucket, &location.key);
        let signed = sign_request(
            "PUT",
            &self.endpoint_host(),
            &canonical_uri,
            body.as_bytes(),
            Utc::now(),
            &self.credentials,
        );

        let response = self
            .client
            .put(&url)
            .header("authorization", &signed.authorization)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.content_sha256)
            .header("content-type", "application/geo+json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StorageError::Status { status, uri: url });
        }
        Ok(())
    }
}

#[async_trait]
impl StorageIo for S3StorageIo {
    async fn read_text(&self, uri: &str) -> Result<String, StorageError> {
        if uri.starts_with("s3://") {
            let location = S3Location::parse(uri)?;
            self.get_object(&location).await
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            debug!("Plain HTTP read for {}", uri);
            let response = self.client.get(uri).send().await?;
            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                return Err(StorageError::Status {
                    status,
                    uri: uri.to_string(),
                });
            }
            Ok(response.text().await?)
        } else {
            Ok(tokio::fs::read_to_string(uri).await?)
        }
    }

    async fn write_text(&self, uri: &str, body: &str) -> Result<(), StorageError> {
        if uri.starts_with("s3://") {
            let location = S3Location::parse(uri)?;
            self.put_object(&location, body).await
        } else {
            tokio::fs::write(uri, body).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credentials() -> StorageCredentials {
        StorageCredentials {
            endpoint: "http://s3-service.zoo.svc.cluster.local:9000".to_string(),
            access_key: "minio-admin".to_string(),
            secret_key: "minio-secret-password".to_string(),
            region: "RegionOne".to_string(),
            bucket: Some("eoepca".to_string()),
        }
    }

    #[test]
    fn test_parse_location() {
        let location = S3Location::parse("s3://results/run-1/catalog.json").unwrap();
        assert_eq!(location.bucket, "results");
        assert_eq!(location.key, "run-1/catalog.json");
    }

    #[test]
    fn test_parse_rejects_other_schemes_and_bare_buckets() {
        assert!(S3Location::parse("https://bucket/key").is_err());
        assert!(S3Location::parse("s3://bucket-only").is_err());
        assert!(S3Location::parse("s3:///key").is_err());
    }

    #[test]
    fn test_access_point_overrides_bucket() {
        let io = S3StorageIo::new(make_credentials(), Some("ws-alice".to_string()));
        let location = S3Location::parse("s3://results/run-1/catalog.json").unwrap();
        assert_eq!(io.bucket_for(&location), "ws-alice");

        let io = S3StorageIo::new(make_credentials(), None);
        assert_eq!(io.bucket_for(&location), "results");
    }

    #[test]
    fn test_object_url_path_style() {
        let io = S3StorageIo::new(make_credentials(), None);
        let (url, canonical) = io.object_url("results", "run-1/catalog.json");
        assert_eq!(
            url,
            "http://s3-service.zoo.svc.cluster.local:9000/results/run-1/catalog.json"
        );
        assert_eq!(canonical, "/results/run-1/catalog.json");
    }

    #[test]
    fn test_endpoint_host_strips_scheme() {
        let io = S3StorageIo::new(make_credentials(), None);
        assert_eq!(io.endpoint_host(), "s3-service.zoo.svc.cluster.local:9000");
    }

    #[tokio::test]
    async fn test_filesystem_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let io = S3StorageIo::new(make_credentials(), None);
        let text = io.read_text(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "{}");
    }
}
