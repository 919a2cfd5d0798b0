use std::{pin::Pin, sync::Arc};

use bson::Bson;
use futures::{lock::Mutex, Future, FutureExt as _};
use log::debug;
use serde::Serialize;
use tokio::net::unix::OwnedWriteHalf;

use crate::{
    calls_registry::CallsRegistry,
    message::{BusMessage, MessageData},
    message_stream::AsyncWriteFrame,
};

/// Future resolving into a call response
pub type CallFuture = Pin<Box<dyn Future<Output = crate::Result<Bson>> + Send>>;

/// A writer half to call remote objects and emit signals
#[derive(Clone)]
pub struct RpcWriter {
    /// Writer part of the socket
    socket: Arc<Mutex<OwnedWriteHalf>>,
    /// Registry to add outgoing calls into for later resolve
    registry: Arc<Mutex<CallsRegistry>>,
}

impl RpcWriter {
    pub(crate) fn new(socket: OwnedWriteHalf, registry: Arc<Mutex<CallsRegistry>>) -> Self {
        Self {
            socket: Arc::new(Mutex::new(socket)),
            registry,
        }
    }

    /// Call a method on a remote object. Every call is a fresh round trip;
    /// the returned future resolves when the peer responds.
    /// If the peer has disconnected, the future resolves into an error
    /// right away
    pub async fn call(
        &self,
        path: &str,
        interface: &str,
        member: &str,
        args: Vec<Bson>,
    ) -> CallFuture {
        let (id, result) = self.registry.lock().await.add_call();

        debug!("New call {id} to {path}: {interface}.{member}");

        let message = BusMessage {
            id,
            data: MessageData::Call {
                path: path.to_owned(),
                interface: interface.to_owned(),
                member: member.to_owned(),
                args,
            },
        };

        // In case we failed to send, resolve the call right away
        if let Err(e) = self.write(&message).await {
            debug!("Error making a call: {e:?}");

            self.registry
                .lock()
                .await
                .resolve(id, Err(crate::Error::PeerDisconnected));
        }

        Box::pin(result.map(|chan_result| match chan_result {
            Ok(response) => response,
            // Channel closed on teardown
            Err(_) => Err(crate::Error::PeerDisconnected),
        }))
    }

    /// Emit a one-way signal
    pub async fn emit(
        &self,
        path: &str,
        interface: &str,
        member: &str,
        args: Vec<Bson>,
    ) -> crate::Result<()> {
        debug!("Emitting signal {interface}.{member} on {path}");

        let message = BusMessage {
            id: -1,
            data: MessageData::Signal {
                path: path.to_owned(),
                interface: interface.to_owned(),
                member: member.to_owned(),
                args,
            },
        };

        self.write(&message).await
    }

    /// Respond to an incoming call.
    /// Returns `true` if succesfully responded
    pub async fn respond<T: Serialize>(&self, message_id: i64, data: crate::Result<T>) -> bool {
        let data = data.and_then(|value| {
            bson::to_bson(&value).map_err(|e| crate::Error::ResultType(e.to_string()))
        });

        debug!("Responding to {message_id} with {data:?}");

        let message = BusMessage {
            id: message_id,
            data: MessageData::Response(data),
        };

        if let Err(e) = self.write(&message).await {
            debug!("Failed to write response: {e:?}");
            return false;
        }

        true
    }

    async fn write(&self, message: &BusMessage) -> crate::Result<()> {
        self.socket.lock().await.write_frame(message).await
    }
}
