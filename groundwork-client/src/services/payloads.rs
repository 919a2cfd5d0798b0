//! Payloads service client and the DNF payload sub-client.
//!
//! The payloads service exposes one active payload object; its type
//! decides which sub-client drives software selection. Only the DNF
//! payload carries derived state here.

use std::sync::Arc;

use bson::{Bson, Document};
use futures::{future::try_join_all, lock::Mutex, StreamExt};
use log::{debug, error};

use groundwork_rpc::{
    variant::{decode_map, encode_map, Variant},
    Error, Signal,
};

use crate::{
    connection::Connection,
    proxy::RemoteObject,
    registry::Service,
    services::changed_contains,
    state::{Dispatcher, Environment, Group, StateAction},
};

const PAYLOAD_BASE_INTERFACE: &str = "org.groundwork.Installer.Modules.Payloads.Payload";
const PAYLOAD_DNF_INTERFACE: &str = "org.groundwork.Installer.Modules.Payloads.Payload.DNF";

#[derive(Clone)]
pub struct PayloadsClient {
    object: RemoteObject,
    connection: Arc<Connection>,
    dispatcher: Dispatcher,
}

impl PayloadsClient {
    pub fn new(connection: Arc<Connection>, dispatcher: Dispatcher) -> Self {
        let object = RemoteObject::new(
            connection.clone(),
            Service::Payloads.object_path(),
            Service::Payloads.interface_name(),
        );

        Self {
            object,
            connection,
            dispatcher,
        }
    }

    /// Resolve the active payload, dispatch its type and bring up the
    /// type-specific sub-client
    pub async fn init(&self) -> crate::Result<Option<PayloadDnfClient>> {
        let active = self.get_active_payload().await?;

        let payload_type = self.get_payload_type(&active).await?;
        self.dispatcher
            .dispatch(StateAction::SetPayloadType(payload_type.clone()));

        if payload_type == "DNF" {
            let dnf = PayloadDnfClient::new(self.connection.clone(), self.dispatcher.clone(), &active);
            dnf.init().await?;

            return Ok(Some(dnf));
        }

        Ok(None)
    }

    /// Path of the active payload object
    pub async fn get_active_payload(&self) -> crate::Result<String> {
        self.object.get_typed("ActivePayload").await
    }

    /// Payload type of the payload object at `path`
    pub async fn get_payload_type(&self, path: &str) -> crate::Result<String> {
        RemoteObject::new(self.connection.clone(), path, PAYLOAD_BASE_INTERFACE)
            .get_typed("Type")
            .await
    }

    /// Total space required by the payload
    pub async fn get_required_space(&self) -> crate::Result<i64> {
        self.object
            .call_typed("CalculateRequiredSpace", vec![])
            .await
    }
}

/// Sub-client bound to the active DNF payload object. Reuses the payloads
/// connection
#[derive(Clone)]
pub struct PayloadDnfClient {
    object: RemoteObject,
    connection: Arc<Connection>,
    dispatcher: Dispatcher,
    /// Environment seen by the latest selection fetch. A selection change
    /// carrying a different environment triggers a groups refresh
    last_environment: Arc<Mutex<Option<String>>>,
}

impl PayloadDnfClient {
    pub fn new(connection: Arc<Connection>, dispatcher: Dispatcher, payload_path: &str) -> Self {
        let object = RemoteObject::new(connection.clone(), payload_path, PAYLOAD_DNF_INTERFACE);

        Self {
            object,
            connection,
            dispatcher,
            last_environment: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn init(&self) -> crate::Result<()> {
        self.start_event_monitor().await;
        self.init_data().await
    }

    async fn init_data(&self) -> crate::Result<()> {
        self.refresh_environments().await?;
        self.refresh_packages_selection().await?;

        // Groups follow the initially selected environment
        let selection = self.get_packages_selection().await?;
        let environment = selection
            .get_str("environment")
            .ok()
            .filter(|environment| !environment.is_empty())
            .map(str::to_owned);

        *self.last_environment.lock().await = environment.clone();

        if let Some(environment) = environment {
            self.refresh_groups(&environment).await?;
        }

        Ok(())
    }

    /// Fetch the environment list with per-environment descriptions
    pub async fn refresh_environments(&self) -> crate::Result<()> {
        let ids = self.get_environments().await?;

        let environments = try_join_all(ids.into_iter().map(|id| async move {
            let data = self.get_environment_data(&id).await?;

            Ok::<_, Error>(Environment {
                name: data.get_str("name").unwrap_or_default().to_owned(),
                description: data.get_str("description").unwrap_or_default().to_owned(),
                id,
            })
        }))
        .await?;

        self.dispatcher
            .dispatch(StateAction::SetEnvironments(environments));

        Ok(())
    }

    /// Fetch the packages selection and dispatch it
    pub async fn refresh_packages_selection(&self) -> crate::Result<()> {
        let selection = self.get_packages_selection().await?;
        self.dispatcher
            .dispatch(StateAction::SetPackagesSelection(selection));

        Ok(())
    }

    /// Fetch group data for the groups visible in `environment`
    pub async fn refresh_groups(&self, environment: &str) -> crate::Result<()> {
        let data = self.get_environment_data(environment).await?;

        let optional = string_list(&data, "optional-groups");
        let visible = string_list(&data, "visible-groups");
        let default = string_list(&data, "default-groups");

        // Optional groups first, then the visible ones not already listed
        let mut all = optional.clone();
        for group in &visible {
            if !all.contains(group) {
                all.push(group.clone());
            }
        }

        let groups = try_join_all(all.into_iter().map(|id| {
            let optional = &optional;
            let default = &default;

            async move {
                let group_data = self.get_group_data(&id).await?;

                Ok::<_, Error>(Group {
                    name: group_data.get_str("name").unwrap_or_default().to_owned(),
                    description: group_data
                        .get_str("description")
                        .unwrap_or_default()
                        .to_owned(),
                    is_default: default.contains(&id),
                    is_optional: optional.contains(&id),
                    id,
                })
            }
        }))
        .await?;

        self.dispatcher.dispatch(StateAction::SetGroups(groups));

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
        if signal.member != "PropertiesChanged"
            || signal.path.as_str() != self.object.path()
            || !changed_contains(&signal, PAYLOAD_DNF_INTERFACE, "PackagesSelection")
        {
            debug!(
                "Unhandled signal on {}: {}.{} {:?}",
                signal.path, signal.interface, signal.member, signal.args
            );
            return;
        }

        if let Some(environment) = selection_environment(&signal) {
            if !environment.is_empty() {
                self.handle_environment_change(&environment).await;
            }
        }

        if let Err(e) = self.refresh_packages_selection().await {
            error!("Packages selection refresh failed: {e}");
        }
    }

    async fn handle_environment_change(&self, environment: &str) {
        let mut last = self.last_environment.lock().await;

        if last.as_deref() == Some(environment) {
            return;
        }

        *last = Some(environment.to_owned());
        drop(last);

        if let Err(e) = self.refresh_groups(environment).await {
            error!("Groups refresh failed: {e}");
        }
    }

    pub async fn get_default_environment(&self) -> crate::Result<String> {
        self.object.call_typed("GetDefaultEnvironment", vec![]).await
    }

    pub async fn get_environments(&self) -> crate::Result<Vec<String>> {
        self.object.call_typed("GetEnvironments", vec![]).await
    }

    pub async fn resolve_environment(&self, environment_spec: &str) -> crate::Result<String> {
        self.object
            .call_typed("ResolveEnvironment", vec![environment_spec.into()])
            .await
    }

    pub async fn get_environment_data(&self, environment_spec: &str) -> crate::Result<Document> {
        let structure: Document = self
            .object
            .call_typed("GetEnvironmentData", vec![environment_spec.into()])
            .await?;

        decode_map(&structure)
    }

    pub async fn get_group_data(&self, group_spec: &str) -> crate::Result<Document> {
        let structure: Document = self
            .object
            .call_typed("GetGroupData", vec![group_spec.into()])
            .await?;

        decode_map(&structure)
    }

    /// The current packages selection as plain values
    pub async fn get_packages_selection(&self) -> crate::Result<Document> {
        let structure: Document = self.object.get_typed("PackagesSelection").await?;

        decode_map(&structure)
    }

    /// Update the packages selection. Fields left unspecified preserve
    /// their previously-existing values; one write call
    pub async fn set_packages_selection(
        &self,
        environment: Option<&str>,
        groups: Option<&[String]>,
    ) -> crate::Result<()> {
        let mut selection = self.get_packages_selection().await?;

        if let Some(environment) = environment {
            selection.insert("environment", environment);
        }

        if let Some(groups) = groups {
            selection.insert(
                "groups",
                groups
                    .iter()
                    .map(|group| Bson::String(group.clone()))
                    .collect::<Vec<_>>(),
            );
        }

        let structure = encode_map(selection)?;

        self.object
            .set("PackagesSelection", Variant::new("a{sv}", structure))
            .await
    }
}

/// `PropertiesChanged` payloads nest the selection as a variant structure.
/// Extract the environment it carries, if any
fn selection_environment(signal: &Signal) -> Option<String> {
    let changed = match signal.args.get(1) {
        Some(Bson::Document(changed)) => changed,
        _ => return None,
    };

    let selection: Variant = bson::from_bson(changed.get("PackagesSelection")?.clone()).ok()?;
    let fields = match selection.value {
        Bson::Document(fields) => fields,
        _ => return None,
    };

    let environment: Variant = bson::from_bson(fields.get("environment")?.clone()).ok()?;
    match environment.value {
        Bson::String(environment) => Some(environment),
        _ => None,
    }
}

fn string_list(data: &Document, key: &str) -> Vec<String> {
    data.get_array(key)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
