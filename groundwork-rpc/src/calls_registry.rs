use std::collections::HashMap;

use bson::Bson;
use futures::channel::oneshot::{channel, Receiver, Sender};
use log::{debug, info, trace, warn};

/// A registry of outgoing calls. A call is added before its frame is
/// written and resolved when the matching response arrives
pub(crate) struct CallsRegistry {
    id_counter: i64,
    /// Active calls
    calls: HashMap<i64, Sender<crate::Result<Bson>>>,
}

impl CallsRegistry {
    pub fn new() -> Self {
        Self {
            id_counter: 0,
            calls: HashMap::new(),
        }
    }

    pub fn add_call(&mut self) -> (i64, Receiver<crate::Result<Bson>>) {
        let (sender, receiver) = channel();
        let id = self.next_id();

        self.calls.insert(id, sender);

        trace!("Add new call");

        (id, receiver)
    }

    pub fn resolve(&mut self, message_id: i64, response: crate::Result<Bson>) {
        if let Some(channel) = self.calls.remove(&message_id) {
            if channel.send(response).is_err() {
                warn!("Caller dropped the call handle. Failed to send a response")
            } else {
                debug!("Succesfully resolved {message_id} call")
            }
        } else {
            warn!("Unexpected peer response for call id {message_id}")
        }
    }

    /// Drop every pending call. Their handles resolve into a disconnect error
    pub fn clear_pending(&mut self) {
        info!("Clearing calls queue");
        self.calls.clear()
    }

    fn next_id(&mut self) -> i64 {
        self.id_counter += 1;
        self.id_counter
    }
}
