use std::{collections::HashMap, sync::Arc};

use log::debug;

use groundwork_rpc::Error;

use crate::connection::Connection;

/// Backend services the installer session talks to. Object paths and
/// interface names are fixed strings established by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Boss,
    Localization,
    Network,
    Payloads,
    Runtime,
    Timezone,
    Users,
}

impl Service {
    pub fn interface_name(&self) -> &'static str {
        match self {
            Service::Boss => "org.groundwork.Installer.Boss",
            Service::Localization => "org.groundwork.Installer.Modules.Localization",
            Service::Network => "org.groundwork.Installer.Modules.Network",
            Service::Payloads => "org.groundwork.Installer.Modules.Payloads",
            Service::Runtime => "org.groundwork.Installer.Modules.Runtime.UserInterface",
            Service::Timezone => "org.groundwork.Installer.Modules.Timezone",
            Service::Users => "org.groundwork.Installer.Modules.Users",
        }
    }

    pub fn object_path(&self) -> &'static str {
        match self {
            Service::Boss => "/org/groundwork/Installer/Boss",
            Service::Localization => "/org/groundwork/Installer/Modules/Localization",
            Service::Network => "/org/groundwork/Installer/Modules/Network",
            Service::Payloads => "/org/groundwork/Installer/Modules/Payloads",
            Service::Runtime => "/org/groundwork/Installer/Modules/Runtime/UserInterface",
            Service::Timezone => "/org/groundwork/Installer/Modules/Timezone",
            Service::Users => "/org/groundwork/Installer/Modules/Users",
        }
    }

    /// Short name used as the peer name in logs
    pub fn name(&self) -> &'static str {
        match self {
            Service::Boss => "boss",
            Service::Localization => "localization",
            Service::Network => "network",
            Service::Payloads => "payloads",
            Service::Runtime => "runtime",
            Service::Timezone => "timezone",
            Service::Users => "users",
        }
    }
}

/// One live connection per backend service.
///
/// Repeated lookups with no address return the live instance. An explicit
/// new address tears the old instance down and rebuilds exactly once.
/// The registry exclusively owns its connections; call sites borrow them
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<Service, Arc<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Get the live connection for `service`, creating or replacing it
    /// according to `address`
    pub async fn get_or_create(
        &mut self,
        service: Service,
        address: Option<&str>,
    ) -> crate::Result<Arc<Connection>> {
        if let Some(existing) = self.connections.get(&service) {
            match address {
                None => return Ok(existing.clone()),
                Some(address) if existing.address() == address => return Ok(existing.clone()),
                Some(address) => {
                    debug!(
                        "Repointing `{}` from {} to {address}",
                        service.name(),
                        existing.address()
                    );

                    // Teardown is fire-and-forget
                    existing.close();
                }
            }
        }

        let address = address.ok_or(Error::NotConnected)?;

        let connection = Arc::new(Connection::connect(service.name(), address).await?);
        self.connections.insert(service, connection.clone());

        Ok(connection)
    }

    /// Live connection for `service`, if any. Does not create
    pub fn get(&self, service: Service) -> Option<Arc<Connection>> {
        self.connections.get(&service).cloned()
    }

    /// Register an externally created connection. Used by tests to plug in
    /// a socket-pair connection
    pub fn insert(&mut self, service: Service, connection: Arc<Connection>) {
        if let Some(previous) = self.connections.insert(service, connection) {
            previous.close();
        }
    }
}
