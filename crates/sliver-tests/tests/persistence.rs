//! Persistence tests for RocksDB-backed nodes.

use sliver_proto::Status;
use sliver_tests::TestNetwork;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sliver_tests=debug,sliver_store=debug")
        .with_test_writer()
        .try_init();
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

#[tokio::test]
async fn test_files_survive_restart() {
    init_tracing();

    let mut network = TestNetwork::with_rocksdb_nodes(2).unwrap();
    let client = network.client();
    let hosts = network.hosts();
    let data = sample(90);

    let manifest = client.upload(&data, &hosts, 3).await.unwrap();

    network.restart(0).unwrap();
    network.restart(1).unwrap();

    assert_eq!(client.list_manifests(&hosts[0]).await.unwrap(), vec![manifest.id]);
    assert_eq!(client.download(manifest.id, &hosts).await.unwrap(), data);
}

#[tokio::test]
async fn test_credentials_and_ownership_survive_restart() {
    init_tracing();

    let mut network = TestNetwork::with_rocksdb_nodes(1).unwrap();
    let owner = network.client();
    let other = network.client();
    let hosts = network.hosts();

    let manifest = owner.upload(&sample(50), &hosts, 1).await.unwrap();
    other.register(&hosts[0]).await.unwrap();

    network.restart(0).unwrap();

    let err = other.delete_manifest(&hosts[0], manifest.id).await.unwrap_err();
    assert_eq!(err.status(), Some(Status::Forbidden));

    let removed = owner.delete_manifest(&hosts[0], manifest.id).await.unwrap();
    assert_eq!(removed as usize, manifest.slice_hashes().len());

    network.restart(0).unwrap();
    assert!(owner.list_manifests(&hosts[0]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_keyring_on_disk() {
    init_tracing();

    let dir = tempfile::TempDir::new().unwrap();
    let network = TestNetwork::with_nodes(1).unwrap();
    let host = network.hosts().remove(0);

    let config = sliver_store::StoreConfig::rocksdb(dir.path().to_path_buf());
    let credential = {
        let containers = config.open().unwrap();
        let client = sliver_node::SliverClient::with_keyring(
            network.transport().clone(),
            containers.credential_store(),
            network.fragment_size(),
        );
        client.register(&host).await.unwrap()
    };

    let containers = config.open().unwrap();
    assert_eq!(containers.credential_store().get(&host).unwrap(), Some(credential));
}
