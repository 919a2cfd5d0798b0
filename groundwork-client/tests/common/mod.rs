//! A mock backend service for driving client tests over a socket pair.

use std::sync::Arc;

use bson::Bson;
use tokio::net::UnixStream;

use groundwork_client::{connection::Connection, task::TASK_INTERFACE};
use groundwork_rpc::{rpc::Rpc, writer::RpcWriter, Incoming, MethodCall};

/// A signal the mock emits right after responding to a call
pub struct Emit {
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<Bson>,
}

impl Emit {
    #[allow(dead_code)]
    pub fn new(path: &str, interface: &str, member: &str, args: Vec<Bson>) -> Self {
        Self {
            path: path.to_owned(),
            interface: interface.to_owned(),
            member: member.to_owned(),
            args,
        }
    }

    /// Task lifecycle signal on `path`
    #[allow(dead_code)]
    pub fn task(path: &str, member: &str) -> Self {
        Self::new(path, TASK_INTERFACE, member, vec![])
    }
}

/// What the mock does with one incoming call
pub type Reply = (groundwork_rpc::Result<Bson>, Vec<Emit>);

/// Plain successful reply
#[allow(dead_code)]
pub fn ok(value: impl Into<Bson>) -> Reply {
    (Ok(value.into()), vec![])
}

/// Successful property reply, wire-tagged
#[allow(dead_code)]
pub fn property(value: &groundwork_rpc::Variant) -> Reply {
    (
        Ok(bson::to_bson(value).expect("variant serializes")),
        vec![],
    )
}

/// Property name of an incoming `Properties.Get` call, if it is one
#[allow(dead_code)]
pub fn property_name(call: &MethodCall) -> Option<&str> {
    if call.interface == "org.freedesktop.DBus.Properties"
        && (call.member == "Get" || call.member == "Set")
    {
        call.args.get(1).and_then(Bson::as_str)
    } else {
        None
    }
}

/// The args payload of a `PropertiesChanged` notification
#[allow(dead_code)]
pub fn properties_changed_args(interface: &str, changed: bson::Document) -> Vec<Bson> {
    vec![interface.into(), changed.into(), Bson::Array(vec![])]
}

/// Connect a client [Connection] to a mock service driven by `handler`.
/// The returned writer can emit unsolicited signals towards the client
pub fn mock_service<H>(service: &str, handler: H) -> (Arc<Connection>, RpcWriter)
where
    H: FnMut(&MethodCall) -> Reply + Send + 'static,
{
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let (client_stream, service_stream) = UnixStream::pair().unwrap();

    let connection = Arc::new(Connection::from_stream(
        client_stream,
        service,
        "/run/groundwork/test.sock",
    ));

    let rpc = Rpc::new(service_stream, "mock");
    let writer = rpc.writer().clone();

    tokio::spawn(serve(rpc, handler));

    (connection, writer)
}

async fn serve<H>(mut rpc: Rpc, mut handler: H)
where
    H: FnMut(&MethodCall) -> Reply,
{
    while let Some(incoming) = rpc.poll().await {
        if let Incoming::Call(call) = incoming {
            let (response, signals) = handler(&call);
            call.respond(response).await;

            for signal in signals {
                let _ = rpc
                    .emit(&signal.path, &signal.interface, &signal.member, signal.args)
                    .await;
            }
        }
    }
}
