mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use bson::{doc, Bson};
use futures::StreamExt;

use common::{mock_service, ok, properties_changed_args, property};
use groundwork_client::{
    registry::Service,
    services::network::NetworkClient,
    state::{Dispatcher, StateAction},
};
use groundwork_rpc::{variant::variant, Error};

#[tokio::test]
async fn test_invalid_hostname_never_reaches_the_backend() {
    let set_calls = Arc::new(AtomicUsize::new(0));

    let handler = {
        let set_calls = set_calls.clone();

        move |call: &groundwork_rpc::MethodCall| {
            if call.member == "Set" {
                set_calls.fetch_add(1, Ordering::SeqCst);
            }
            ok(Bson::Null)
        }
    };

    let (connection, _writer) = mock_service("network", handler);
    let (dispatcher, _actions) = Dispatcher::new();

    let client = NetworkClient::new(connection, dispatcher);

    assert!(matches!(
        client.set_hostname("not a hostname!").await,
        Err(Error::Validation(_))
    ));
    assert_eq!(set_calls.load(Ordering::SeqCst), 0);

    client.set_hostname("node-1.example.org").await.unwrap();
    assert_eq!(set_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_monitor_refreshes_changed_slices() {
    let handler = |call: &groundwork_rpc::MethodCall| match common::property_name(call) {
        Some("Connected") => property(&variant("b", true)),
        Some("Hostname") => property(&variant("s", "installer.example.org")),
        other => panic!("Unexpected property: {other:?}"),
    };

    let (connection, writer) = mock_service("network", handler);
    let (dispatcher, mut actions) = Dispatcher::new();

    let client = NetworkClient::new(connection, dispatcher);
    client.start_event_monitor().await;

    writer
        .emit(
            Service::Network.object_path(),
            "org.freedesktop.DBus.Properties",
            "PropertiesChanged",
            properties_changed_args(
                Service::Network.interface_name(),
                doc! { "Connected": { "t": "b", "v": true } },
            ),
        )
        .await
        .unwrap();

    assert!(matches!(
        actions.next().await,
        Some(StateAction::SetConnected(true))
    ));

    writer
        .emit(
            Service::Network.object_path(),
            "org.freedesktop.DBus.Properties",
            "PropertiesChanged",
            properties_changed_args(
                Service::Network.interface_name(),
                doc! { "Hostname": { "t": "s", "v": "installer.example.org" } },
            ),
        )
        .await
        .unwrap();

    match actions.next().await {
        Some(StateAction::SetHostname(hostname)) => {
            assert_eq!(hostname, "installer.example.org")
        }
        other => panic!("Expected a hostname write, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_failure_surfaces_as_critical_error() {
    let (connection, _writer) = mock_service("network", |_call| {
        (
            Err(Error::Fault {
                name: "org.groundwork.Installer.Error.Internal".into(),
                message: "backend gone".into(),
            }),
            vec![],
        )
    });
    let (dispatcher, mut actions) = Dispatcher::new();

    let client = NetworkClient::new(connection, dispatcher);
    client.refresh_connected().await;

    assert!(matches!(
        actions.next().await,
        Some(StateAction::SetCriticalError(_))
    ));
}
