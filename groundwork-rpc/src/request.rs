use bson::Bson;
use serde::Serialize;

use crate::writer::RpcWriter;

/// Incoming frame yielded by [crate::rpc::Rpc::poll]
pub enum Incoming {
    /// Method call to serve
    Call(MethodCall),
    /// Unsolicited change notification
    Signal(Signal),
}

/// An unsolicited change notification observed on the connection.
/// Not pre-filtered: handlers see every signal and filter themselves
#[derive(Debug, Clone)]
pub struct Signal {
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<Bson>,
}

/// Incoming method call. Answer it through [MethodCall::respond]
pub struct MethodCall {
    /// Message id from the peer
    message_id: i64,
    /// Writer to respond to the message
    writer: RpcWriter,
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<Bson>,
}

impl MethodCall {
    pub(crate) fn new(
        message_id: i64,
        writer: RpcWriter,
        path: String,
        interface: String,
        member: String,
        args: Vec<Bson>,
    ) -> Self {
        Self {
            message_id,
            writer,
            path,
            interface,
            member,
            args,
        }
    }

    pub fn message_id(&self) -> i64 {
        self.message_id
    }

    /// Respond to the call
    pub async fn respond<T: Serialize>(&self, data: crate::Result<T>) -> bool {
        self.writer.respond(self.message_id, data).await
    }
}
