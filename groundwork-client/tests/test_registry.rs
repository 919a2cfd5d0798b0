use std::{path::PathBuf, sync::Arc};

use tokio::net::UnixListener;

use groundwork_client::registry::{ConnectionRegistry, Service};
use groundwork_rpc::Error;

fn socket_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "groundwork-test-{name}-{}.sock",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

#[tokio::test]
async fn test_identity_stable_reuse() {
    let path = socket_path("reuse");
    let _listener = UnixListener::bind(&path).unwrap();
    let address = path.to_str().unwrap();

    let mut registry = ConnectionRegistry::new();

    let first = registry
        .get_or_create(Service::Users, Some(address))
        .await
        .unwrap();
    let second = registry
        .get_or_create(Service::Users, Some(address))
        .await
        .unwrap();
    let third = registry.get_or_create(Service::Users, None).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(first.address(), address);
}

#[tokio::test]
async fn test_no_address_without_connection_is_an_error() {
    let mut registry = ConnectionRegistry::new();

    assert!(matches!(
        registry.get_or_create(Service::Users, None).await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_address_change_replaces_the_connection() {
    let path1 = socket_path("replace-1");
    let _listener1 = UnixListener::bind(&path1).unwrap();
    let path2 = socket_path("replace-2");
    let _listener2 = UnixListener::bind(&path2).unwrap();

    let mut registry = ConnectionRegistry::new();

    let old = registry
        .get_or_create(Service::Network, Some(path1.to_str().unwrap()))
        .await
        .unwrap();
    let new = registry
        .get_or_create(Service::Network, Some(path2.to_str().unwrap()))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(new.address(), path2.to_str().unwrap());

    // The old instance was torn down: its calls fail immediately
    let result = old
        .call(
            Service::Network.object_path(),
            Service::Network.interface_name(),
            "GetHostname",
            vec![],
        )
        .await;
    assert!(matches!(result, Err(Error::PeerDisconnected)));

    // The new instance is the live singleton
    let again = registry.get_or_create(Service::Network, None).await.unwrap();
    assert!(Arc::ptr_eq(&new, &again));
}

#[tokio::test]
async fn test_services_are_keyed_independently() {
    let path = socket_path("independent");
    let _listener = UnixListener::bind(&path).unwrap();
    let address = path.to_str().unwrap();

    let mut registry = ConnectionRegistry::new();

    let users = registry
        .get_or_create(Service::Users, Some(address))
        .await
        .unwrap();
    let network = registry
        .get_or_create(Service::Network, Some(address))
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&users, &network));
    assert_eq!(users.service(), "users");
    assert_eq!(network.service(), "network");
}
