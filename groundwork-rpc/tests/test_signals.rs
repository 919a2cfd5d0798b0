use futures::FutureExt;
use tokio::net::UnixStream;

use groundwork_rpc::{rpc::Rpc, Incoming};

const OBJECT_PATH: &str = "/org/groundwork/Installer/Modules/Localization";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

#[tokio::test]
async fn test_signal_roundtrip() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let rpc1 = Rpc::new(stream1, "service");
    let mut rpc2 = Rpc::new(stream2, "client");

    rpc1.emit(
        OBJECT_PATH,
        PROPERTIES_INTERFACE,
        "PropertiesChanged",
        vec!["org.groundwork.Installer.Modules.Localization".into()],
    )
    .await
    .unwrap();

    let signal = match rpc2.poll().await.unwrap() {
        Incoming::Signal(signal) => signal,
        _ => panic!("Expected an incoming signal"),
    };

    assert_eq!(signal.path, OBJECT_PATH);
    assert_eq!(signal.interface, PROPERTIES_INTERFACE);
    assert_eq!(signal.member, "PropertiesChanged");
    assert_eq!(
        signal.args,
        vec![bson::Bson::String(
            "org.groundwork.Installer.Modules.Localization".into()
        )]
    );
}

#[tokio::test]
async fn test_signals_interleave_with_responses() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (stream1, stream2) = UnixStream::pair().unwrap();

    let mut rpc1 = Rpc::new(stream1, "client");
    let mut rpc2 = Rpc::new(stream2, "service");

    let call = rpc1
        .call(OBJECT_PATH, "iface", "GetLanguages", vec![])
        .await;

    let request = match rpc2.poll().await.unwrap() {
        Incoming::Call(call) => call,
        _ => panic!("Expected an incoming call"),
    };

    // Signal first, then the response. The signal is yielded by poll,
    // the response resolves the pending call
    rpc2.emit(OBJECT_PATH, "iface", "Stopped", vec![])
        .await
        .unwrap();
    assert!(request.respond(Ok(vec!["en".to_owned()])).await);

    let signal = match rpc1.poll().await.unwrap() {
        Incoming::Signal(signal) => signal,
        _ => panic!("Expected an incoming signal"),
    };
    assert_eq!(signal.member, "Stopped");

    futures::select! {
        response = call.fuse() => {
            assert_eq!(
                response.unwrap(),
                bson::Bson::Array(vec![bson::Bson::String("en".into())])
            );
        },
        _ = rpc1.poll().fuse() => {}
    }
}
