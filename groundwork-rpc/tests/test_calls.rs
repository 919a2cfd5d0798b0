use futures::{select, FutureExt};
use tokio::net::UnixStream;

use groundwork_rpc::{rpc::Rpc, Error, Incoming};

const OBJECT_PATH: &str = "/org/groundwork/Installer/Modules/Network";
const INTERFACE_NAME: &str = "org.groundwork.Installer.Modules.Network";

#[tokio::test]
async fn test_simple_call() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let mut rpc1 = Rpc::new(stream1, "client");
    let mut rpc2 = Rpc::new(stream2, "service");

    let call = rpc1
        .call(OBJECT_PATH, INTERFACE_NAME, "GetHostname", vec![])
        .await;

    // Poll the stream to receive the request
    let request = match rpc2.poll().await.unwrap() {
        Incoming::Call(call) => call,
        _ => panic!("Expected an incoming call"),
    };

    assert_eq!(request.path, OBJECT_PATH);
    assert_eq!(request.interface, INTERFACE_NAME);
    assert_eq!(request.member, "GetHostname");
    assert!(request.args.is_empty());

    assert!(request.respond(Ok("localhost")).await);

    select! {
        response = call.fuse() => {
            assert_eq!(response.unwrap(), bson::Bson::String("localhost".into()));
        },
        _ = rpc1.poll().fuse() => {}
    }
}

#[tokio::test]
async fn test_call_args() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let mut rpc1 = Rpc::new(stream1, "client");
    let mut rpc2 = Rpc::new(stream2, "service");

    let call = rpc1
        .call(
            OBJECT_PATH,
            INTERFACE_NAME,
            "CheckServer",
            vec!["example.org".into(), true.into()],
        )
        .await;

    let request = match rpc2.poll().await.unwrap() {
        Incoming::Call(call) => call,
        _ => panic!("Expected an incoming call"),
    };

    assert_eq!(
        request.args,
        vec![
            bson::Bson::String("example.org".into()),
            bson::Bson::Boolean(true)
        ]
    );

    assert!(request.respond(Ok(false)).await);

    select! {
        response = call.fuse() => {
            assert_eq!(response.unwrap(), bson::Bson::Boolean(false));
        },
        _ = rpc1.poll().fuse() => {}
    }
}

#[tokio::test]
async fn test_fault_propagates() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let mut rpc1 = Rpc::new(stream1, "client");
    let mut rpc2 = Rpc::new(stream2, "service");

    let call = rpc1
        .call(OBJECT_PATH, INTERFACE_NAME, "GetKeyboardLayouts", vec![])
        .await;

    let request = match rpc2.poll().await.unwrap() {
        Incoming::Call(call) => call,
        _ => panic!("Expected an incoming call"),
    };

    assert!(request
        .respond::<()>(Err(Error::Fault {
            name: "org.freedesktop.DBus.Error.UnknownMethod".into(),
            message: "No such method".into(),
        }))
        .await);

    select! {
        response = call.fuse() => {
            match response {
                Err(Error::Fault { name, .. }) => {
                    assert_eq!(name, "org.freedesktop.DBus.Error.UnknownMethod")
                }
                other => panic!("Expected a named fault, got {other:?}"),
            }
        },
        _ = rpc1.poll().fuse() => {}
    }
}

#[tokio::test]
async fn test_peer_disconnect() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let mut rpc1 = Rpc::new(stream1, "client");

    let call = {
        let rpc2 = Rpc::new(stream2, "service");

        let call = rpc1
            .call(OBJECT_PATH, INTERFACE_NAME, "GetHostname", vec![])
            .await;

        drop(rpc2);
        call
    };

    // The reader notices the hangup and pending calls resolve into an error
    assert!(rpc1.poll().await.is_none());
    assert!(matches!(call.await, Err(Error::PeerDisconnected)));
}
