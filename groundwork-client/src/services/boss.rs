//! Boss client: the backend coordination interface.

use std::sync::Arc;

use crate::{
    connection::Connection,
    proxy::RemoteObject,
    registry::Service,
    task::TASK_INTERFACE,
};

#[derive(Clone)]
pub struct BossClient {
    object: RemoteObject,
    connection: Arc<Connection>,
}

impl BossClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        let object = RemoteObject::new(
            connection.clone(),
            Service::Boss.object_path(),
            Service::Boss.interface_name(),
        );

        Self { object, connection }
    }

    /// Total number of steps of the task at `task_path`
    pub async fn get_steps(&self, task_path: &str) -> crate::Result<i64> {
        RemoteObject::new(self.connection.clone(), task_path, TASK_INTERFACE)
            .get_typed("Steps")
            .await
    }

    /// Paths of the installation tasks
    pub async fn install_with_tasks(&self) -> crate::Result<Vec<String>> {
        self.object.call_typed("InstallWithTasks", vec![]).await
    }

    /// Set the runtime locale of the backend
    pub async fn set_locale(&self, locale: &str) -> crate::Result<()> {
        self.object.call("SetLocale", vec![locale.into()]).await?;

        Ok(())
    }
}
