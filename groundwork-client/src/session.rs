//! Orchestrated bring-up of the installer session.

use crate::{
    registry::{ConnectionRegistry, Service},
    services::{
        boss::BossClient, localization::LocalizationClient, network::NetworkClient,
        payloads::{PayloadDnfClient, PayloadsClient}, runtime::RuntimeClient,
        timezone::TimezoneClient, users::UsersClient,
    },
    state::{Dispatcher, StateActions},
};

/// One installer session: a connection registry, a dispatcher and the
/// service clients built on top of them.
///
/// The boss comes up first; module clients follow, each performing its
/// own ordered initial fetch
pub struct Session {
    registry: ConnectionRegistry,
    dispatcher: Dispatcher,
    boss: Option<BossClient>,
    localization: Option<LocalizationClient>,
    network: Option<NetworkClient>,
    payloads: Option<PayloadsClient>,
    payload_dnf: Option<PayloadDnfClient>,
    runtime: Option<RuntimeClient>,
    timezone: Option<TimezoneClient>,
    users: Option<UsersClient>,
}

impl Session {
    /// A session and the stream of state actions it dispatches. Drive a
    /// [crate::state::State] reducer with the stream to keep derived
    /// state current
    pub fn new() -> (Session, StateActions) {
        let (dispatcher, actions) = Dispatcher::new();

        let session = Self {
            registry: ConnectionRegistry::new(),
            dispatcher,
            boss: None,
            localization: None,
            network: None,
            payloads: None,
            payload_dnf: None,
            runtime: None,
            timezone: None,
            users: None,
        };

        (session, actions)
    }

    /// Connect every service at `address` and fetch the initial state
    pub async fn init(&mut self, address: &str) -> crate::Result<()> {
        let address = Some(address);

        let connection = self.registry.get_or_create(Service::Boss, address).await?;
        self.boss = Some(BossClient::new(connection));

        let connection = self
            .registry
            .get_or_create(Service::Localization, address)
            .await?;
        let localization = LocalizationClient::new(connection, self.dispatcher.clone());
        localization.init().await?;
        self.localization = Some(localization);

        let connection = self.registry.get_or_create(Service::Network, address).await?;
        let network = NetworkClient::new(connection, self.dispatcher.clone());
        network.init().await?;
        self.network = Some(network);

        let connection = self.registry.get_or_create(Service::Runtime, address).await?;
        let runtime = RuntimeClient::new(connection, self.dispatcher.clone());
        runtime.init().await?;
        self.runtime = Some(runtime);

        let connection = self.registry.get_or_create(Service::Payloads, address).await?;
        let payloads = PayloadsClient::new(connection, self.dispatcher.clone());
        self.payload_dnf = payloads.init().await?;
        self.payloads = Some(payloads);

        let connection = self.registry.get_or_create(Service::Timezone, address).await?;
        self.timezone = Some(TimezoneClient::new(connection));

        let connection = self.registry.get_or_create(Service::Users, address).await?;
        self.users = Some(UsersClient::new(connection));

        Ok(())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registry_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.registry
    }

    pub fn boss(&self) -> Option<&BossClient> {
        self.boss.as_ref()
    }

    pub fn localization(&self) -> Option<&LocalizationClient> {
        self.localization.as_ref()
    }

    pub fn network(&self) -> Option<&NetworkClient> {
        self.network.as_ref()
    }

    pub fn payloads(&self) -> Option<&PayloadsClient> {
        self.payloads.as_ref()
    }

    pub fn payload_dnf(&self) -> Option<&PayloadDnfClient> {
        self.payload_dnf.as_ref()
    }

    pub fn runtime(&self) -> Option<&RuntimeClient> {
        self.runtime.as_ref()
    }

    pub fn timezone(&self) -> Option<&TimezoneClient> {
        self.timezone.as_ref()
    }

    pub fn users(&self) -> Option<&UsersClient> {
        self.users.as_ref()
    }
}
