//! Runtime service client: user-interface runtime data.

use std::sync::Arc;

use bson::Document;
use futures::StreamExt;
use log::debug;

use groundwork_rpc::{variant::decode_map, Error, Signal};

use crate::{
    connection::Connection,
    proxy::{RemoteObject, INVALID_ARGS},
    registry::Service,
    services::changed_contains,
    state::{Dispatcher, StateAction},
};

#[derive(Clone)]
pub struct RuntimeClient {
    object: RemoteObject,
    connection: Arc<Connection>,
    dispatcher: Dispatcher,
}

impl RuntimeClient {
    pub fn new(connection: Arc<Connection>, dispatcher: Dispatcher) -> Self {
        let object = RemoteObject::new(
            connection.clone(),
            Service::Runtime.object_path(),
            Service::Runtime.interface_name(),
        );

        Self {
            object,
            connection,
            dispatcher,
        }
    }

    pub async fn init(&self) -> crate::Result<()> {
        self.start_event_monitor().await;
        self.refresh_password_policies().await
    }

    /// Fetch the password policies and dispatch them
    pub async fn refresh_password_policies(&self) -> crate::Result<()> {
        let policies = self.get_password_policies().await?;
        self.dispatcher
            .dispatch(StateAction::SetPasswordPolicies(policies));

        Ok(())
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
        let interface = Service::Runtime.interface_name();

        match signal.member.as_str() {
            "PropertiesChanged" if changed_contains(&signal, interface, "PasswordPolicies") => {
                if let Err(e) = self.refresh_password_policies().await {
                    debug!("Password policies refresh failed: {e}");
                }
            }
            _ => debug!(
                "Unhandled signal on {}: {}.{} {:?}",
                signal.path, signal.interface, signal.member, signal.args
            ),
        }
    }

    pub async fn get_password_policies(&self) -> crate::Result<Document> {
        self.object.get_typed("PasswordPolicies").await
    }

    async fn get_product_data(&self) -> crate::Result<Document> {
        self.object.get_typed("ProductData").await
    }

    /// Whether the OS release is considered final. Older backends have no
    /// `ProductData` property and report it through `IsFinal` instead
    pub async fn get_is_final(&self) -> crate::Result<bool> {
        match self.get_product_data().await {
            Ok(data) => {
                let data = decode_map(&data)?;

                data.get_bool("is-final-release").map_err(|e| {
                    Error::ResultType(format!("`is-final-release` in product data: {e}"))
                })
            }
            Err(Error::Fault { ref name, .. }) if name == INVALID_ARGS => {
                self.object.get_typed("IsFinal").await
            }
            Err(e) => Err(e),
        }
    }
}
