//! AWS Signature Version 4 request signing
//!
//! Just enough of the SigV4 scheme for path-style object GET/PUT against
//! S3-compatible stores: empty query string, `host`, `x-amz-date` and
//! `x-amz-content-sha256` as the signed headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::StorageCredentials;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Headers to attach to a signed request
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encode a path, AWS style: unreserved characters and `/` pass
/// through, everything else becomes uppercase `%XX`.
pub fn uri_encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

pub(crate) fn canonical_request(
    method: &str,
    canonical_uri: &str,
    host: &str,
    amz_date: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{uri}\n\nhost:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{date}\n\n{signed}\n{hash}",
        method = method,
        uri = canonical_uri,
        host = host,
        hash = payload_hash,
        date = amz_date,
        signed = SIGNED_HEADERS,
    )
}

/// Sign one request and return the headers to attach.
///
/// `canonical_uri` is the already-encoded absolute path (`/bucket/key`).
pub fn sign_request(
    method: &str,
    host: &str,
    canonical_uri: &str,
    payload: &[u8],
    now: DateTime<Utc>,
    credentials: &StorageCredentials,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(payload);

    let request = canonical_request(method, canonical_uri, host, &amz_date, &payload_hash);

    let scope = format!("{}/{}/s3/aws4_request", date_stamp, credentials.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        sha256_hex(request.as_bytes())
    );

    let secret = format!("AWS4{}", credentials.secret_key);
    let key_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
    let key_region = hmac_sha256(&key_date, credentials.region.as_bytes());
    let key_service = hmac_sha256(&key_region, b"s3");
    let key_signing = hmac_sha256(&key_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&key_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key, scope, SIGNED_HEADERS, signature
    );

    SignedHeaders {
        authorization,
        amz_date,
        content_sha256: payload_hash,
    }
}
