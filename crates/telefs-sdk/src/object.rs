use async_trait::async_trait;
use serde::Serialize;
use telefs_transport::OpContext;
use telefs_types::{BlobRef, MessageId, ObjectRecord};

use crate::capability::{HashKind, Operation, RandomAccessObject};
use crate::error::{FsError, FsResult};

/// A stored object as the facade knows it.
///
/// Handles returned by `put` carry the blob reference, message id and size
/// of the upload. Handles built from a catalog record only know the name;
/// the catalog stores nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectHandle {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<BlobRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blob: None,
            message_id: None,
            size: None,
        }
    }

    pub fn uploaded(name: impl Into<String>, blob: BlobRef, message_id: MessageId, size: u64) -> Self {
        Self {
            name: name.into(),
            blob: Some(blob),
            message_id: Some(message_id),
            size: Some(size),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> ObjectRecord {
        ObjectRecord::new(self.name.clone())
    }
}

impl From<ObjectRecord> for ObjectHandle {
    fn from(record: ObjectRecord) -> Self {
        Self::new(record.into_name())
    }
}

fn unsupported<T>(op: Operation) -> FsResult<T> {
    Err(FsError::Unsupported {
        operation: op.as_str(),
    })
}

#[async_trait]
impl RandomAccessObject for ObjectHandle {
    async fn open(&self, _ctx: &OpContext, _offset: u64, _len: Option<u64>) -> FsResult<Vec<u8>> {
        unsupported(Operation::Open)
    }

    async fn update(&self, _ctx: &OpContext, _data: &[u8]) -> FsResult<()> {
        unsupported(Operation::Update)
    }

    async fn remove(&self, _ctx: &OpContext) -> FsResult<()> {
        unsupported(Operation::Remove)
    }

    async fn content_hash(&self, _ctx: &OpContext, _kind: HashKind) -> FsResult<String> {
        unsupported(Operation::ContentHash)
    }

    async fn mod_time(&self, _ctx: &OpContext) -> FsResult<u64> {
        unsupported(Operation::ModTime)
    }
}
