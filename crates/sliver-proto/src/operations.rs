//! Storage node operations and their payloads.
//!
//! Every operation is addressed by name (the request path) and carries a
//! canonical-encoded request body. Successful responses carry the
//! canonical-encoded result.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use sliver_core::encoding::{CanonicalDecode, CanonicalEncode, DecodeError};
use sliver_core::Hash;

use crate::manifest::Manifest;
use crate::slice::Slice;

/// Named node operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Issue a fresh credential
    IssueCredential,
    /// Store a slice under a manifest
    PutSlice,
    /// Fetch a slice by hash
    GetSlice,
    /// Publish or extend a manifest
    PutManifest,
    /// Fetch a manifest
    GetManifest,
    /// Delete a manifest and its slices
    DeleteManifest,
    /// List stored manifest ids
    ListManifests,
}

impl OperationKind {
    /// All operations, in table order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::IssueCredential,
        OperationKind::PutSlice,
        OperationKind::GetSlice,
        OperationKind::PutManifest,
        OperationKind::GetManifest,
        OperationKind::DeleteManifest,
        OperationKind::ListManifests,
    ];

    /// Operation name as used in request paths.
    pub const fn name(&self) -> &'static str {
        match self {
            OperationKind::IssueCredential => "credential.issue",
            OperationKind::PutSlice => "slice.put",
            OperationKind::GetSlice => "slice.get",
            OperationKind::PutManifest => "manifest.put",
            OperationKind::GetManifest => "manifest.get",
            OperationKind::DeleteManifest => "manifest.delete",
            OperationKind::ListManifests => "manifest.list",
        }
    }

    /// Looks up an operation by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Request method used for the operation.
    pub const fn method(&self) -> &'static str {
        if self.is_mutating() {
            "POST"
        } else {
            "GET"
        }
    }

    /// Request path for the operation.
    pub fn path(&self) -> String {
        format!("/{}", self.name())
    }

    /// Returns true if the operation changes stored state and therefore
    /// requires a verified authorization token.
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            OperationKind::PutSlice | OperationKind::PutManifest | OperationKind::DeleteManifest
        )
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Status {
    /// Success
    Ok = 200,
    /// Malformed request
    BadRequest = 400,
    /// Missing or invalid authorization
    Unauthorized = 401,
    /// Authorized, but not the owner of the target
    Forbidden = 403,
    /// Unknown operation or missing object
    NotFound = 404,
    /// Target exists with conflicting contents
    Conflict = 409,
    /// Node-side failure
    Error = 500,
}

impl Status {
    /// Numeric code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates from a numeric code.
    pub fn from_code(code: u16) -> Result<Self, DecodeError> {
        match code {
            200 => Ok(Status::Ok),
            400 => Ok(Status::BadRequest),
            401 => Ok(Status::Unauthorized),
            403 => Ok(Status::Forbidden),
            404 => Ok(Status::NotFound),
            409 => Ok(Status::Conflict),
            500 => Ok(Status::Error),
            _ => Err(DecodeError::InvalidEnumTag(code as u32)),
        }
    }
}

/// Store a slice and register it with its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutSliceRequest {
    /// Manifest the slice belongs to
    pub manifest_id: Hash,
    /// The slice
    pub slice: Slice,
}

/// Result of storing a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutSliceResponse {
    /// Content hash of the slice
    pub hash: Hash,
    /// False if an identical slice was already stored
    pub created: bool,
}

/// Fetch a slice by content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSliceRequest {
    /// Slice hash
    pub hash: Hash,
}

/// Publish a manifest, or extend the advertised slices of one the caller owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutManifestRequest {
    /// The manifest
    pub manifest: Manifest,
}

/// Result of publishing a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutManifestResponse {
    /// False if the manifest already existed
    pub created: bool,
}

/// Fetch or delete a manifest by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestIdRequest {
    /// Manifest id
    pub id: Hash,
}

/// Result of deleting a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteManifestResponse {
    /// Number of slices removed with it
    pub slices_removed: u32,
}

/// Manifest ids held by a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestList {
    /// Ids, in unspecified order
    pub ids: Vec<Hash>,
}

impl CanonicalEncode for PutSliceRequest {
    fn encode(&self, buf: &mut BytesMut) {
        self.manifest_id.encode(buf);
        self.slice.encode(buf);
    }
}

impl CanonicalDecode for PutSliceRequest {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            manifest_id: Hash::decode(buf)?,
            slice: Slice::decode(buf)?,
        })
    }
}

impl CanonicalEncode for PutSliceResponse {
    fn encode(&self, buf: &mut BytesMut) {
        self.hash.encode(buf);
        self.created.encode(buf);
    }
}

impl CanonicalDecode for PutSliceResponse {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            hash: Hash::decode(buf)?,
            created: bool::decode(buf)?,
        })
    }
}

impl CanonicalEncode for GetSliceRequest {
    fn encode(&self, buf: &mut BytesMut) {
        self.hash.encode(buf);
    }
}

impl CanonicalDecode for GetSliceRequest {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            hash: Hash::decode(buf)?,
        })
    }
}

impl CanonicalEncode for PutManifestRequest {
    fn encode(&self, buf: &mut BytesMut) {
        self.manifest.encode(buf);
    }
}

impl CanonicalDecode for PutManifestRequest {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            manifest: Manifest::decode(buf)?,
        })
    }
}

impl CanonicalEncode for PutManifestResponse {
    fn encode(&self, buf: &mut BytesMut) {
        self.created.encode(buf);
    }
}

impl CanonicalDecode for PutManifestResponse {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            created: bool::decode(buf)?,
        })
    }
}

impl CanonicalEncode for ManifestIdRequest {
    fn encode(&self, buf: &mut BytesMut) {
        self.id.encode(buf);
    }
}

impl CanonicalDecode for ManifestIdRequest {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            id: Hash::decode(buf)?,
        })
    }
}

impl CanonicalEncode for DeleteManifestResponse {
    fn encode(&self, buf: &mut BytesMut) {
        self.slices_removed.encode(buf);
    }
}

impl CanonicalDecode for DeleteManifestResponse {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            slices_removed: u32::decode(buf)?,
        })
    }
}

impl CanonicalEncode for ManifestList {
    fn encode(&self, buf: &mut BytesMut) {
        self.ids.encode(buf);
    }
}

impl CanonicalDecode for ManifestList {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self {
            ids: Vec::<Hash>::decode(buf)?,
        })
    }
}
