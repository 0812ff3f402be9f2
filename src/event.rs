//! Ingress events.
//!
//! A batch arrives as a bucket event notification listing the objects that
//! were written. Only the bucket name and object key of each record matter
//! here; everything else in the notification is ignored.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::Deserialize;

/// One object named by an event record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// S3 event notification, reduced to what the dispatcher needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

impl S3Event {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Objects in delivery order, keys URL-decoded.
    pub fn objects(&self) -> Vec<ObjectRef> {
        self.records
            .iter()
            .map(|r| ObjectRef::new(r.s3.bucket.name.clone(), decode_key(&r.s3.object.key)))
            .collect()
    }
}

/// Decode an object key as it appears in an event notification.
///
/// Keys are form-encoded: `+` stands for a space and reserved bytes are
/// `%XX` escaped. A key that does not decode to UTF-8 is returned as-is.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
