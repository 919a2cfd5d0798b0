use std::{ops::Deref, sync::Arc};

use futures::lock::Mutex;
use log::{debug, info, trace};
use tokio::net::{unix::OwnedReadHalf, UnixStream};

use crate::{
    calls_registry::CallsRegistry,
    message::{BusMessage, MessageData},
    message_stream::AsyncReadFrame,
    request::{Incoming, MethodCall, Signal},
    writer::RpcWriter,
};

/// RPC handle to a bus peer
pub struct Rpc {
    /// Verbose peer name
    peer_name: String,
    /// Socket reader to poll for incoming frames
    socket: OwnedReadHalf,
    /// Socket writer handle to make calls and send responses
    writer: RpcWriter,
    /// Call registry to resolve incoming responses
    calls_registry: Arc<Mutex<CallsRegistry>>,
}

impl Rpc {
    /// Make a new RPC handle from [tokio::net::UnixStream].
    /// `peer_name` is a verbose peer name used in logging
    pub fn new(stream: UnixStream, peer_name: &str) -> Self {
        trace!("Making new RPC handle from a stream");

        let calls_registry = Arc::new(Mutex::new(CallsRegistry::new()));
        let (reader, writer) = stream.into_split();

        Self {
            peer_name: peer_name.to_owned(),
            socket: reader,
            writer: RpcWriter::new(writer, calls_registry.clone()),
            calls_registry,
        }
    }

    /// Verbose peer name
    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// Get client writer
    pub fn writer(&self) -> &RpcWriter {
        &self.writer
    }

    /// Poll the connection, resolving responses to outgoing calls and
    /// yielding incoming calls and signals. Returns `None` when the peer
    /// disconnects; pending calls then resolve into a disconnect error
    pub async fn poll(&mut self) -> Option<Incoming> {
        loop {
            let message: BusMessage = match self.socket.read_frame().await {
                Ok(message) => message,
                Err(e) => {
                    info!(
                        "Failed to read incoming message from <{}>: {e}",
                        self.peer_name
                    );
                    self.calls_registry.lock().await.clear_pending();
                    return None;
                }
            };

            debug!("Incoming message: {message:?}");

            match message.data {
                MessageData::Call {
                    path,
                    interface,
                    member,
                    args,
                } => {
                    return Some(Incoming::Call(MethodCall::new(
                        message.id,
                        self.writer.clone(),
                        path,
                        interface,
                        member,
                        args,
                    )));
                }
                MessageData::Signal {
                    path,
                    interface,
                    member,
                    args,
                } => {
                    return Some(Incoming::Signal(Signal {
                        path,
                        interface,
                        member,
                        args,
                    }));
                }
                MessageData::Response(body) => {
                    self.calls_registry.lock().await.resolve(message.id, body)
                }
            }
        }
    }
}

impl Deref for Rpc {
    type Target = RpcWriter;

    fn deref(&self) -> &Self::Target {
        &self.writer
    }
}
