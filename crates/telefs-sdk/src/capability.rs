//! Capability traits.
//!
//! A storage backend advertises what it can do through the traits it
//! implements instead of one monolithic filesystem interface. telefs can put
//! and list; it cannot read ranges, rewrite, delete, hash or timestamp an
//! object. Those per-object operations exist on [`RandomAccessObject`] only
//! so callers get an explicit [`Unsupported`](crate::FsError::Unsupported) refusal.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use telefs_transport::OpContext;
use telefs_types::ObjectRecord;

use crate::error::FsResult;
use crate::object::ObjectHandle;

/// Stores a named object.
#[async_trait]
pub trait Putter: Send + Sync {
    async fn put(&self, ctx: &OpContext, name: &str, data: &[u8]) -> FsResult<ObjectHandle>;
}

/// Enumerates stored objects.
#[async_trait]
pub trait Lister: Send + Sync {
    /// Records whose name starts with `prefix`, in catalog order.
    async fn list(&self, ctx: &OpContext, prefix: &str) -> FsResult<Vec<ObjectRecord>>;
}

/// Per-object access beyond put and list.
#[async_trait]
pub trait RandomAccessObject: Send + Sync {
    /// Read `len` bytes starting at `offset`.
    async fn open(&self, ctx: &OpContext, offset: u64, len: Option<u64>) -> FsResult<Vec<u8>>;

    /// Replace the object's content.
    async fn update(&self, ctx: &OpContext, data: &[u8]) -> FsResult<()>;

    async fn remove(&self, ctx: &OpContext) -> FsResult<()>;

    /// Content digest of the given kind, hex-encoded.
    async fn content_hash(&self, ctx: &OpContext, kind: HashKind) -> FsResult<String>;

    /// Last modification time as seconds since the Unix epoch.
    async fn mod_time(&self, ctx: &OpContext) -> FsResult<u64>;
}

/// Digest kinds a backend may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

/// Operations a caller may query with [`Capabilities::supports`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    List,
    Open,
    Update,
    Remove,
    ContentHash,
    ModTime,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Put => "put",
            Operation::List => "list",
            Operation::Open => "open",
            Operation::Update => "update",
            Operation::Remove => "remove",
            Operation::ContentHash => "content_hash",
            Operation::ModTime => "mod_time",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a backend supports, reported up front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub put: bool,
    pub list: bool,
    /// Covers open, update, remove and mod_time.
    pub random_access: bool,
    /// Supported digest kinds; empty means no hashing at all.
    pub hashes: Vec<HashKind>,
}

impl Capabilities {
    pub fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::Put => self.put,
            Operation::List => self.list,
            Operation::Open | Operation::Update | Operation::Remove | Operation::ModTime => {
                self.random_access
            }
            Operation::ContentHash => !self.hashes.is_empty(),
        }
    }
}
