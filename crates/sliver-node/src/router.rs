//! Operation table.
//!
//! Each route ties an operation name to a request decoder, a handler and a
//! response encoder. The table is a fixed list built once when the node
//! starts; lookups are by name.

use std::collections::HashMap;

use sliver_auth::Verified;
use sliver_core::encoding::{CanonicalDecode, CanonicalEncode};
use sliver_proto::{
    GetSliceRequest, ManifestIdRequest, OperationKind, PutManifestRequest, PutSliceRequest,
};

use crate::error::NodeError;
use crate::node::{handlers, StorageNode};

/// Decodes the body, runs the handler and encodes its result.
pub type Dispatch = fn(&StorageNode, &[u8], Option<&Verified>) -> Result<Vec<u8>, NodeError>;

/// One entry of the operation table.
#[derive(Clone, Copy)]
pub struct Route {
    /// Operation served
    pub kind: OperationKind,
    /// Typed dispatch
    pub dispatch: Dispatch,
}

macro_rules! route {
    ($kind:expr, $request:ty => $handler:path) => {
        Route {
            kind: $kind,
            dispatch: |node, body, caller| {
                let request = <$request>::from_bytes(body)?;
                let response = $handler(node, request, caller)?;
                Ok(response.to_vec())
            },
        }
    };
}

/// The fixed list of routes.
pub fn routes() -> Vec<Route> {
    vec![
        route!(OperationKind::IssueCredential, () => handlers::issue_credential),
        route!(OperationKind::PutSlice, PutSliceRequest => handlers::put_slice),
        route!(OperationKind::GetSlice, GetSliceRequest => handlers::get_slice),
        route!(OperationKind::PutManifest, PutManifestRequest => handlers::put_manifest),
        route!(OperationKind::GetManifest, ManifestIdRequest => handlers::get_manifest),
        route!(OperationKind::DeleteManifest, ManifestIdRequest => handlers::delete_manifest),
        route!(OperationKind::ListManifests, () => handlers::list_manifests),
    ]
}

/// Name-indexed operation table.
pub struct Router {
    routes: HashMap<&'static str, Route>,
}

impl Router {
    /// Builds the table from [`routes`].
    pub fn new() -> Self {
        let routes = routes()
            .into_iter()
            .map(|route| (route.kind.name(), route))
            .collect();
        Self { routes }
    }

    /// Looks up a route by operation name.
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
