//! Network service client: connectivity state and the hostname.

use std::sync::Arc;

use futures::StreamExt;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use groundwork_rpc::{variant::variant, Error, Signal};

use crate::{
    connection::Connection,
    proxy::RemoteObject,
    registry::Service,
    services::changed_contains,
    state::{Dispatcher, StateAction},
};

/// Hostname format accepted before anything is sent to the backend
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});

/// True if `hostname` can be configured for the installed system
pub fn is_valid_hostname(hostname: &str) -> bool {
    hostname.len() <= 64 && HOSTNAME_RE.is_match(hostname)
}

#[derive(Clone)]
pub struct NetworkClient {
    object: RemoteObject,
    connection: Arc<Connection>,
    dispatcher: Dispatcher,
}

impl NetworkClient {
    pub fn new(connection: Arc<Connection>, dispatcher: Dispatcher) -> Self {
        let object = RemoteObject::new(
            connection.clone(),
            Service::Network.object_path(),
            Service::Network.interface_name(),
        );

        Self {
            object,
            connection,
            dispatcher,
        }
    }

    pub async fn init(&self) -> crate::Result<()> {
        self.start_event_monitor().await;
        self.init_data().await;

        Ok(())
    }

    async fn init_data(&self) {
        self.refresh_connected().await;
        self.refresh_hostname().await;
    }

    /// Fetch the connection state. Failures surface through the
    /// critical-error slice instead of propagating
    pub async fn refresh_connected(&self) {
        match self.get_connected().await {
            Ok(connected) => self
                .dispatcher
                .dispatch(StateAction::SetConnected(connected)),
            Err(e) => self
                .dispatcher
                .dispatch(StateAction::SetCriticalError(e.to_string())),
        }
    }

    /// Fetch the hostname. Failures surface through the critical-error
    /// slice instead of propagating
    pub async fn refresh_hostname(&self) {
        match self.get_hostname().await {
            Ok(hostname) => self.dispatcher.dispatch(StateAction::SetHostname(hostname)),
            Err(e) => self
                .dispatcher
                .dispatch(StateAction::SetCriticalError(e.to_string())),
        }
    }

    pub async fn start_event_monitor(&self) {
        let mut signals = self.connection.subscribe().await;
        let client = self.clone();

        tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                client.handle_signal(signal).await;
            }
        });
    }

    async fn handle_signal(&self, signal: Signal) {
        let interface = Service::Network.interface_name();

        match signal.member.as_str() {
            "PropertiesChanged" if changed_contains(&signal, interface, "Connected") => {
                self.refresh_connected().await
            }
            "PropertiesChanged" if changed_contains(&signal, interface, "Hostname") => {
                self.refresh_hostname().await
            }
            _ => debug!(
                "Unhandled signal on {}: {}.{} {:?}",
                signal.path, signal.interface, signal.member, signal.args
            ),
        }
    }

    /// The bool state of the network connection
    pub async fn get_connected(&self) -> crate::Result<bool> {
        self.object.get_typed("Connected").await
    }

    /// The hostname of the installed system
    pub async fn get_hostname(&self) -> crate::Result<String> {
        self.object.get_typed("Hostname").await
    }

    /// Write the hostname. Input failing the local format check never
    /// reaches the backend
    pub async fn set_hostname(&self, hostname: &str) -> crate::Result<()> {
        if !is_valid_hostname(hostname) {
            return Err(Error::Validation(format!("invalid hostname `{hostname}`")));
        }

        self.object.set("Hostname", variant("s", hostname)).await
    }
}
