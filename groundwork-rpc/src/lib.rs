/*!
Bus RPC layer used by the Groundwork installer client to talk to backend
services.

The library:
- Receives [tokio::net::UnixStream] and returns an RPC handle;
- Allows calling methods on remote objects, and emitting and receiving
  signals, over length-prefixed BSON frames;
- Tags wire values with explicit type signatures via [variant::Variant].

Use [rpc::Rpc::poll] to pump the connection. This resolves responses to
outgoing calls and yields incoming calls and signals.

# Examples

Calling a remote object:
```
use futures::{select, FutureExt};
use tokio::net::UnixStream;

use groundwork_rpc::rpc::Rpc;

async fn call() {
    let stream = UnixStream::connect("/run/groundwork/bus.sock")
        .await
        .unwrap();
    let mut rpc = Rpc::new(stream, "localization");

    let call = rpc
        .call(
            "/org/groundwork/Installer/Modules/Localization",
            "org.groundwork.Installer.Modules.Localization",
            "GetLanguages",
            vec![],
        )
        .await;

    select! {
        response = call.fuse() => {
            println!("Languages: {response:?}")
        },
        _ = rpc.poll().fuse() => {}
    }
}
```

Serving the peer side:
```
use tokio::net::UnixStream;

use groundwork_rpc::{rpc::Rpc, Incoming};

async fn serve() {
    let stream = UnixStream::connect("/run/groundwork/bus.sock")
        .await
        .unwrap();
    let mut rpc = Rpc::new(stream, "backend");

    while let Some(incoming) = rpc.poll().await {
        match incoming {
            Incoming::Call(call) => {
                println!("Incoming method call: {}", call.member);
                call.respond(Ok(42)).await;
            }
            Incoming::Signal(signal) => {
                println!("Incoming signal: {}", signal.member);
            }
        }
    }
}
```
*/

mod calls_registry;
mod error;
pub mod message;
pub mod message_stream;
pub mod request;
pub mod rpc;
pub mod variant;
pub mod writer;

pub use error::*;
pub use request::{Incoming, MethodCall, Signal};
pub use variant::Variant;
