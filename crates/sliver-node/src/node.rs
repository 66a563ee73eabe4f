//! Storage node.
//!
//! A node serves the named operations over its own stores. Reads are open;
//! mutating operations must carry a token signed with a credential this
//! node issued.

use sliver_auth::{CredentialAuthority, RequestVerifier};
use sliver_proto::{Request, Response, Status};
use sliver_store::{ManifestStore, SliceStore, StorageContainers};
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::router::Router;

/// A storage node.
pub struct StorageNode {
    host: String,
    fragment_size: usize,
    verifier: RequestVerifier,
    slices: SliceStore,
    manifests: ManifestStore,
    router: Router,
}

impl StorageNode {
    /// Creates a node from its configuration, opening the configured storage.
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let containers = config.storage.open()?;
        let verifier = config.auth.verifier()?;
        Ok(Self::with_parts(
            config.node.host.clone(),
            config.coding.fragment_size,
            verifier,
            &containers,
        ))
    }

    /// Creates a node over existing containers.
    pub fn with_parts(
        host: String,
        fragment_size: usize,
        verifier: RequestVerifier,
        containers: &StorageContainers,
    ) -> Self {
        info!(host = %host, fragment_size, "Starting storage node");
        Self {
            host,
            fragment_size,
            verifier,
            slices: containers.slice_store(),
            manifests: containers.manifest_store(),
            router: Router::new(),
        }
    }

    /// Host name this node answers to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Fragment size (m) slices stored here must have.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Authority issuing this node's credentials.
    pub fn authority(&self) -> &CredentialAuthority {
        self.verifier.authority()
    }

    /// Slice store.
    pub fn slices(&self) -> &SliceStore {
        &self.slices
    }

    /// Manifest store.
    pub fn manifests(&self) -> &ManifestStore {
        &self.manifests
    }

    /// Serves one request.
    pub fn handle(&self, request: &Request) -> Response {
        let name = request.operation_name();
        let Some(route) = self.router.get(name) else {
            debug!(operation = name, "Unknown operation");
            return Response::error(Status::NotFound, format!("Unknown operation: {name}"));
        };

        if request.host != self.host {
            debug!(host = %request.host, "Request addressed to another host");
            return Response::error(Status::BadRequest, "Misdirected request");
        }
        if request.method != route.kind.method() {
            return Response::error(
                Status::BadRequest,
                format!("{} expects {}", name, route.kind.method()),
            );
        }

        let caller = if route.kind.is_mutating() {
            match self
                .verifier
                .verify_header(request, request.authorization.as_deref())
            {
                Ok(verified) => Some(verified),
                Err(_) => return Response::error(Status::Unauthorized, "Unauthorized"),
            }
        } else {
            None
        };

        match (route.dispatch)(self, request.body_bytes(), caller.as_ref()) {
            Ok(body) => {
                debug!(operation = name, size = body.len(), "Served operation");
                Response::ok(body)
            }
            Err(e) => {
                debug!(operation = name, error = %e, "Operation failed");
                Response::error(e.status(), e.to_string())
            }
        }
    }
}

/// Typed operation handlers.
pub(crate) mod handlers {
    use sliver_auth::Verified;
    use sliver_core::Hash;
    use sliver_proto::{
        Credential, DeleteManifestResponse, GetSliceRequest, Manifest, ManifestIdRequest,
        ManifestList, PutManifestRequest, PutManifestResponse, PutSliceRequest, PutSliceResponse,
        Slice,
    };
    use sliver_store::PublishOutcome;

    use super::StorageNode;
    use crate::error::NodeError;

    fn caller(caller: Option<&Verified>) -> Result<&[u8], NodeError> {
        caller
            .map(|v| v.public_id.as_slice())
            .ok_or(NodeError::Unauthorized)
    }

    pub(crate) fn issue_credential(
        node: &StorageNode,
        _: (),
        _: Option<&Verified>,
    ) -> Result<Credential, NodeError> {
        Ok(node.authority().issue()?)
    }

    pub(crate) fn put_slice(
        node: &StorageNode,
        request: PutSliceRequest,
        verified: Option<&Verified>,
    ) -> Result<PutSliceResponse, NodeError> {
        let requester = caller(verified)?;
        let manifest = node
            .manifests
            .get(&request.manifest_id)?
            .ok_or_else(|| NodeError::NotFound(format!("manifest {}", request.manifest_id)))?;
        if node.manifests.owner(&manifest.id)?.as_deref() != Some(requester) {
            return Err(sliver_store::StoreError::NotOwner(manifest.id.to_hex()).into());
        }

        let fragments = manifest
            .fragment_count(node.fragment_size)
            .map_err(|e| NodeError::BadRequest(e.to_string()))?;
        let slice = &request.slice;
        if slice.fragment_count() != fragments || slice.symbol_len() != node.fragment_size {
            return Err(NodeError::BadRequest(format!(
                "slice geometry {}x{} does not match manifest {}x{}",
                slice.fragment_count(),
                slice.symbol_len(),
                fragments,
                node.fragment_size
            )));
        }

        let (hash, created) = node
            .manifests
            .store_slice(&manifest.id, slice, requester, &node.slices)?;
        Ok(PutSliceResponse { hash, created })
    }

    pub(crate) fn get_slice(
        node: &StorageNode,
        request: GetSliceRequest,
        _: Option<&Verified>,
    ) -> Result<Slice, NodeError> {
        node.slices
            .get(&request.hash)?
            .ok_or_else(|| NodeError::NotFound(format!("slice {}", request.hash)))
    }

    pub(crate) fn put_manifest(
        node: &StorageNode,
        request: PutManifestRequest,
        verified: Option<&Verified>,
    ) -> Result<PutManifestResponse, NodeError> {
        let requester = caller(verified)?;
        let outcome = node.manifests.publish(&request.manifest, requester)?;
        Ok(PutManifestResponse {
            created: outcome == PublishOutcome::Created,
        })
    }

    pub(crate) fn get_manifest(
        node: &StorageNode,
        request: ManifestIdRequest,
        _: Option<&Verified>,
    ) -> Result<Manifest, NodeError> {
        node.manifests
            .get(&request.id)?
            .ok_or_else(|| NodeError::NotFound(format!("manifest {}", request.id)))
    }

    pub(crate) fn delete_manifest(
        node: &StorageNode,
        request: ManifestIdRequest,
        verified: Option<&Verified>,
    ) -> Result<DeleteManifestResponse, NodeError> {
        let requester = caller(verified)?;
        let removed = node.manifests.delete(&request.id, requester, &node.slices)?;
        Ok(DeleteManifestResponse {
            slices_removed: removed as u32,
        })
    }

    pub(crate) fn list_manifests(
        node: &StorageNode,
        _: (),
        _: Option<&Verified>,
    ) -> Result<ManifestList, NodeError> {
        let mut ids: Vec<Hash> = node.manifests.list()?;
        ids.sort();
        Ok(ManifestList { ids })
    }
}
