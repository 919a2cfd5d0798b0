use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bson::Bson;
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    lock::Mutex,
};
use log::{debug, error, warn};
use tokio::{net::UnixStream, task::JoinHandle};

use groundwork_rpc::{rpc::Rpc, writer::RpcWriter, Error, Incoming, Signal};

use crate::{journal, proxy::UNKNOWN_METHOD};

/// Stream of every signal observed on a connection. Nothing is filtered
/// server-side: filtering is the subscriber's responsibility
pub type SignalStream = UnboundedReceiver<Signal>;

type Subscribers = Arc<Mutex<Vec<UnboundedSender<Signal>>>>;

/// A live connection to one backend service.
///
/// The reading half is driven by a spawned pump task which resolves
/// responses to outgoing calls and fans incoming signals out to
/// subscribers. The pump owns the reader; callers borrow the writer
pub struct Connection {
    service: String,
    address: String,
    writer: RpcWriter,
    subscribers: Subscribers,
    closed: Arc<AtomicBool>,
    pump: JoinHandle<()>,
}

impl Connection {
    /// Connect to the service bus at `address` and start pumping the stream
    pub async fn connect(service: &str, address: &str) -> crate::Result<Connection> {
        let stream = UnixStream::connect(address).await.map_err(|e| {
            error!("Failed to connect to `{service}` at {address}: {e}");
            Error::PeerDisconnected
        })?;

        Ok(Self::from_stream(stream, service, address))
    }

    /// Wrap an already established stream. Used by tests to connect over
    /// a socket pair
    pub fn from_stream(stream: UnixStream, service: &str, address: &str) -> Connection {
        let mut rpc = Rpc::new(stream, service);
        let writer = rpc.writer().clone();
        let subscribers: Subscribers = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let pump = tokio::spawn(Self::pump(
            rpc,
            subscribers.clone(),
            closed.clone(),
            service.to_owned(),
        ));

        Self {
            service: service.to_owned(),
            address: address.to_owned(),
            writer,
            subscribers,
            closed,
            pump,
        }
    }

    async fn pump(mut rpc: Rpc, subscribers: Subscribers, closed: Arc<AtomicBool>, service: String) {
        loop {
            match rpc.poll().await {
                Some(Incoming::Signal(signal)) => {
                    debug!(
                        "Signal on `{service}`: {}.{}",
                        signal.interface, signal.member
                    );

                    // Prune subscribers which dropped their stream
                    subscribers
                        .lock()
                        .await
                        .retain(|handler| handler.unbounded_send(signal.clone()).is_ok());
                }
                Some(Incoming::Call(call)) => {
                    warn!("`{service}` client does not serve method `{}`", call.member);

                    call.respond::<()>(Err(Error::Fault {
                        name: UNKNOWN_METHOD.to_owned(),
                        message: format!("`{}` is not served by this client", call.member),
                    }))
                    .await;
                }
                None => {
                    error!("{service} client closed");
                    journal::append(&format!("{service} client closed"));
                    break;
                }
            }
        }

        closed.store(true, Ordering::Relaxed);
        // End subscriber streams
        subscribers.lock().await.clear();
    }

    /// Service this connection is bound to
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Bus address this connection is bound to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Tear the transport down. Close errors are not awaited
    pub fn close(&self) {
        debug!("Closing `{}` connection", self.service);

        self.closed.store(true, Ordering::Relaxed);
        self.pump.abort();
    }

    /// Subscribe to every signal observed on the connection
    pub async fn subscribe(&self) -> SignalStream {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().await.push(sender);
        receiver
    }

    /// Call a method on a remote object and resolve its first return value
    pub async fn call(
        &self,
        path: &str,
        interface: &str,
        member: &str,
        args: Vec<Bson>,
    ) -> crate::Result<Bson> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(Error::PeerDisconnected);
        }

        let pending = self.writer.call(path, interface, member, args).await;
        pending.await
    }

    /// Raw writer handle
    pub fn writer(&self) -> &RpcWriter {
        &self.writer
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
