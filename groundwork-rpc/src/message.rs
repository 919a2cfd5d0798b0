use bson::Bson;
use serde::{Deserialize, Serialize};

/// One frame on the wire
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BusMessage {
    pub id: i64,
    pub data: MessageData,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum MessageData {
    /// Method call against a remote object
    Call {
        path: String,
        interface: String,
        member: String,
        args: Vec<Bson>,
    },
    /// Unsolicited change notification. Sent one-way with id `-1`
    Signal {
        path: String,
        interface: String,
        member: String,
        args: Vec<Bson>,
    },
    /// Response to a call, matched to it by id
    Response(crate::Result<Bson>),
}
