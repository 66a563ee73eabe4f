//! Signing client.
//!
//! The client keeps one credential per node in a keyring, signs every
//! mutating request with it and spreads encoded slices over a set of
//! nodes. Downloads gather whatever slices the nodes still hold and solve
//! for the file on the blocking pool.

use std::collections::HashSet;

use sliver_auth::{sign_request, AuthError};
use sliver_coding::{CodingError, FileDecoder, SliceEncoder};
use sliver_core::encoding::{CanonicalDecode, CanonicalEncode};
use sliver_core::{DecodeError, Hash};
use sliver_proto::{
    Credential, DeleteManifestResponse, GetSliceRequest, Manifest, ManifestIdRequest,
    ManifestList, OperationKind, PutManifestRequest, PutManifestResponse, PutSliceRequest,
    PutSliceResponse, Request, Slice, Status,
};
use sliver_store::{CredentialStore, StorageContainers, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CodingConfig;
use crate::transport::{Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be delivered
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Node answered with a failure status
    #[error("Request failed with {status:?}: {message}")]
    Status {
        /// Status returned
        status: Status,
        /// Message returned
        message: String,
    },

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(#[from] DecodeError),

    /// Signing failed
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Keyring error
    #[error("Keyring error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or decoding failed
    #[error("Coding error: {0}")]
    Coding(#[from] CodingError),

    /// No credential is held for this host
    #[error("No credential for host {0}")]
    NoCredential(String),

    /// No node returned the manifest
    #[error("Manifest unavailable: {0}")]
    ManifestUnavailable(Hash),

    /// The reachable slices do not determine the file
    #[error("Not enough independent slices: rank {rank} of {needed}")]
    Insufficient {
        /// Rank of the gathered slices
        rank: usize,
        /// Fragment count of the file
        needed: usize,
    },

    /// Background decode task failed
    #[error("Decode task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// Status returned by the node, if the failure came from one.
    pub fn status(&self) -> Option<Status> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for a set of storage nodes.
pub struct SliverClient<T> {
    transport: T,
    keyring: CredentialStore,
    fragment_size: usize,
    redundancy: usize,
    nonce_length: usize,
}

impl<T: Transport> SliverClient<T> {
    /// Creates a client with an in-memory keyring.
    pub fn new(transport: T, fragment_size: usize) -> Self {
        Self::with_keyring(
            transport,
            StorageContainers::in_memory().credential_store(),
            fragment_size,
        )
    }

    /// Creates a client with an in-memory keyring using the geometry and
    /// redundancy of `coding`.
    pub fn from_config(transport: T, coding: &CodingConfig) -> Self {
        Self::new(transport, coding.fragment_size).with_redundancy(coding.redundancy)
    }

    /// Creates a client over an existing keyring.
    pub fn with_keyring(transport: T, keyring: CredentialStore, fragment_size: usize) -> Self {
        Self {
            transport,
            keyring,
            fragment_size,
            redundancy: CodingConfig::default().redundancy,
            nonce_length: sliver_auth::factory::DEFAULT_NONCE_LENGTH,
        }
    }

    /// Sets the number of random slices added by [`upload_file`](Self::upload_file).
    pub fn with_redundancy(mut self, redundancy: usize) -> Self {
        self.redundancy = redundancy;
        self
    }

    /// Sets the nonce length used when signing.
    pub fn with_nonce_length(mut self, nonce_length: usize) -> Self {
        self.nonce_length = nonce_length;
        self
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Credential keyring.
    pub fn keyring(&self) -> &CredentialStore {
        &self.keyring
    }

    /// Fragment size used when encoding.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Random slices added beyond the systematic ones by default.
    pub fn redundancy(&self) -> usize {
        self.redundancy
    }

    async fn call(&self, request: Request) -> Result<Vec<u8>, ClientError> {
        let response = self.transport.send(request).await?;
        if response.is_ok() {
            Ok(response.body)
        } else {
            Err(ClientError::Status {
                status: response.status,
                message: response.message(),
            })
        }
    }

    async fn get<R: CanonicalEncode, P: CanonicalDecode>(
        &self,
        host: &str,
        kind: OperationKind,
        body: &R,
    ) -> Result<P, ClientError> {
        let request = Request::new(kind.method(), host, kind.path()).with_binary_body(body.to_vec());
        let bytes = self.call(request).await?;
        Ok(P::from_bytes(&bytes)?)
    }

    async fn signed<R: CanonicalEncode, P: CanonicalDecode>(
        &self,
        host: &str,
        kind: OperationKind,
        body: &R,
    ) -> Result<P, ClientError> {
        let credential = self
            .keyring
            .get(host)?
            .ok_or_else(|| ClientError::NoCredential(host.to_string()))?;
        let mut request =
            Request::new(kind.method(), host, kind.path()).with_binary_body(body.to_vec());
        sign_request(&mut request, &credential, self.nonce_length)?;
        let bytes = self.call(request).await?;
        Ok(P::from_bytes(&bytes)?)
    }

    /// Obtains a credential from `host` and stores it in the keyring,
    /// replacing any previous one.
    pub async fn register(&self, host: &str) -> Result<Credential, ClientError> {
        let credential: Credential = self.get(host, OperationKind::IssueCredential, &()).await?;
        self.keyring.remove(host)?;
        self.keyring.insert(host, &credential)?;
        info!(host, public_id = %credential.public_base64(), "Registered with node");
        Ok(credential)
    }

    /// Registers with `host` unless a credential is already held.
    pub async fn ensure_registered(&self, host: &str) -> Result<(), ClientError> {
        if self.keyring.get(host)?.is_none() {
            self.register(host).await?;
        }
        Ok(())
    }

    /// Publishes a manifest. Returns true if the node did not know it.
    pub async fn publish_manifest(&self, host: &str, manifest: &Manifest) -> Result<bool, ClientError> {
        let request = PutManifestRequest {
            manifest: manifest.clone(),
        };
        let response: PutManifestResponse =
            self.signed(host, OperationKind::PutManifest, &request).await?;
        Ok(response.created)
    }

    /// Stores a slice of a manifest previously published to `host`.
    pub async fn put_slice(
        &self,
        host: &str,
        manifest_id: Hash,
        slice: &Slice,
    ) -> Result<PutSliceResponse, ClientError> {
        let request = PutSliceRequest {
            manifest_id,
            slice: slice.clone(),
        };
        self.signed(host, OperationKind::PutSlice, &request).await
    }

    /// Fetches a slice by hash.
    pub async fn get_slice(&self, host: &str, hash: Hash) -> Result<Slice, ClientError> {
        self.get(host, OperationKind::GetSlice, &GetSliceRequest { hash }).await
    }

    /// Fetches a manifest.
    pub async fn get_manifest(&self, host: &str, id: Hash) -> Result<Manifest, ClientError> {
        self.get(host, OperationKind::GetManifest, &ManifestIdRequest { id }).await
    }

    /// Deletes a manifest and its slices. Returns the number of slices
    /// removed.
    pub async fn delete_manifest(&self, host: &str, id: Hash) -> Result<u32, ClientError> {
        let response: DeleteManifestResponse = self
            .signed(host, OperationKind::DeleteManifest, &ManifestIdRequest { id })
            .await?;
        Ok(response.slices_removed)
    }

    /// Lists the manifests a node holds.
    pub async fn list_manifests(&self, host: &str) -> Result<Vec<Hash>, ClientError> {
        let list: ManifestList = self.get(host, OperationKind::ListManifests, &()).await?;
        Ok(list.ids)
    }

    /// [`upload`](Self::upload) with the client's configured redundancy.
    pub async fn upload_file(&self, data: &[u8], hosts: &[String]) -> Result<Manifest, ClientError> {
        self.upload(data, hosts, self.redundancy).await
    }

    /// Encodes `data` and spreads its slices round-robin over `hosts`.
    ///
    /// Every host receives the manifest; each host then advertises only the
    /// slices it stores. The returned manifest advertises all of them.
    pub async fn upload(
        &self,
        data: &[u8],
        hosts: &[String],
        redundancy: usize,
    ) -> Result<Manifest, ClientError> {
        let encoder = SliceEncoder::new(data, self.fragment_size)?;
        let (manifest, slices) = {
            let mut rng = rand::thread_rng();
            encoder.encode_file(redundancy, &mut rng)?
        };
        let bare = Manifest::new(manifest.id, manifest.length())
            .map_err(CodingError::from)?;

        for host in hosts {
            self.ensure_registered(host).await?;
            self.publish_manifest(host, &bare).await?;
        }
        if !hosts.is_empty() {
            for (i, slice) in slices.iter().enumerate() {
                let host = &hosts[i % hosts.len()];
                self.put_slice(host, manifest.id, slice).await?;
            }
        }

        info!(
            manifest = %manifest.id,
            length = manifest.length(),
            slices = slices.len(),
            hosts = hosts.len(),
            "Uploaded file"
        );
        Ok(manifest)
    }

    /// Gathers slices of `manifest_id` from `hosts` and reconstructs the
    /// file. Unreachable hosts and missing slices are skipped; the call
    /// fails only if the gathered slices do not determine the file.
    pub async fn download(&self, manifest_id: Hash, hosts: &[String]) -> Result<Vec<u8>, ClientError> {
        let mut decoder: Option<FileDecoder> = None;
        let mut slices = Vec::new();
        let mut seen = HashSet::new();

        for host in hosts {
            let manifest = match self.get_manifest(host, manifest_id).await {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(host = %host, manifest = %manifest_id, error = %e, "Manifest fetch failed");
                    continue;
                }
            };
            if decoder.is_none() {
                decoder = Some(FileDecoder::new(manifest.clone(), self.fragment_size)?);
            }

            for hash in manifest.slice_hashes() {
                if !seen.insert(*hash) {
                    continue;
                }
                match self.get_slice(host, *hash).await {
                    Ok(slice) if slice.compute_hash() == *hash => slices.push(slice),
                    Ok(_) => warn!(host = %host, slice = %hash, "Slice does not match its hash"),
                    Err(e) => {
                        debug!(host = %host, slice = %hash, error = %e, "Slice fetch failed");
                        seen.remove(hash);
                    }
                }
            }

            if let Some(decoder) = &decoder {
                if decoder.is_complete(&slices) {
                    break;
                }
            }
        }

        let decoder = decoder.ok_or(ClientError::ManifestUnavailable(manifest_id))?;
        let needed = decoder.fragment_count();
        let rank = decoder.rank(&slices);
        debug!(manifest = %manifest_id, slices = slices.len(), rank, needed, "Solving");

        let solved = tokio::task::spawn_blocking(move || decoder.decode_verified(&slices))
            .await
            .map_err(|e| ClientError::Task(e.to_string()))??;
        solved.ok_or(ClientError::Insufficient { rank, needed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sliver_auth::{CredentialAuthority, RequestVerifier};
    use sliver_core::ServerSecret;

    use crate::node::StorageNode;
    use crate::transport::LoopbackTransport;

    const FRAGMENT: usize = 8;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sliver_node=debug")
            .with_test_writer()
            .try_init();
    }

    fn network(hosts: &[&str]) -> (Arc<LoopbackTransport>, Vec<String>) {
        let transport = Arc::new(LoopbackTransport::new());
        for (i, host) in hosts.iter().enumerate() {
            let authority = CredentialAuthority::new(ServerSecret::from([i as u8 + 1; 32]));
            transport.add_node(Arc::new(StorageNode::with_parts(
                host.to_string(),
                FRAGMENT,
                RequestVerifier::new(authority, 300),
                &StorageContainers::in_memory(),
            )));
        }
        (transport, hosts.iter().map(|h| h.to_string()).collect())
    }

    #[tokio::test]
    async fn test_register_stores_credential() {
        let (transport, hosts) = network(&["a"]);
        let client = SliverClient::new(transport, FRAGMENT);

        let credential = client.register(&hosts[0]).await.unwrap();
        assert_eq!(client.keyring().get("a").unwrap(), Some(credential));
    }

    #[tokio::test]
    async fn test_signed_call_without_credential() {
        let (transport, hosts) = network(&["a"]);
        let client = SliverClient::new(transport, FRAGMENT);
        let manifest = Manifest::new(Hash::compute(b"x"), 1).unwrap();

        let result = client.publish_manifest(&hosts[0], &manifest).await;
        assert!(matches!(result, Err(ClientError::NoCredential(h)) if h == "a"));
    }

    #[tokio::test]
    async fn test_upload_download_single_node() {
        init_tracing();
        let (transport, hosts) = network(&["a"]);
        let client = SliverClient::new(transport, FRAGMENT);
        let data = b"The quick brown fox jumps over the lazy dog".to_vec();

        let manifest = client.upload(&data, &hosts, 2).await.unwrap();
        assert_eq!(manifest.id, Hash::compute(&data));
        assert_eq!(client.list_manifests("a").await.unwrap(), vec![manifest.id]);

        let restored = client.download(manifest.id, &hosts).await.unwrap();
        assert_eq!(restored, data);
    }

    #[tokio::test]
    async fn test_upload_uses_configured_redundancy() {
        let (transport, hosts) = network(&["a"]);
        let coding = CodingConfig {
            fragment_size: FRAGMENT,
            redundancy: 0,
        };
        let client = SliverClient::from_config(transport, &coding);
        assert_eq!(client.redundancy(), 0);

        // 32 bytes in 8-byte fragments: four systematic slices, no random ones.
        let data: Vec<u8> = (0..32).collect();
        let manifest = client.upload_file(&data, &hosts).await.unwrap();
        assert_eq!(manifest.slice_hashes().len(), 4);
        assert_eq!(client.download(manifest.id, &hosts).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_download_unknown_manifest() {
        let (transport, hosts) = network(&["a"]);
        let client = SliverClient::new(transport, FRAGMENT);

        let result = client.download(Hash::compute(b"absent"), &hosts).await;
        assert!(matches!(result, Err(ClientError::ManifestUnavailable(_))));
    }

    #[tokio::test]
    async fn test_get_missing_slice_status() {
        let (transport, hosts) = network(&["a"]);
        let client = SliverClient::new(transport, FRAGMENT);

        let err = client.get_slice(&hosts[0], Hash::compute(b"none")).await.unwrap_err();
        assert_eq!(err.status(), Some(Status::NotFound));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let (transport, hosts) = network(&["a", "b"]);
        let client = SliverClient::new(transport, FRAGMENT);

        let manifest = client.upload(b"", &hosts, 2).await.unwrap();
        assert_eq!(manifest.length(), 0);
        assert!(client.download(manifest.id, &hosts).await.unwrap().is_empty());
    }
}
