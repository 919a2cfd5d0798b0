use std::sync::Arc;

use bson::Bson;
use serde::de::DeserializeOwned;

use groundwork_rpc::{variant::Variant, Error};

use crate::connection::Connection;

/// Interface exposing the property tables of remote objects
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Fault name the backend returns for a method absent from an interface.
/// Matched at feature-detection call sites
pub const UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";

/// Fault name the backend returns for a property an interface does not know
pub const INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";

/// Handle to one remote object. Methods, properties and signals of the
/// object live behind a (connection, path, interface) triple
#[derive(Clone)]
pub struct RemoteObject {
    connection: Arc<Connection>,
    path: String,
    interface: String,
}

impl RemoteObject {
    pub fn new(connection: Arc<Connection>, path: &str, interface: &str) -> Self {
        Self {
            connection,
            path: path.to_owned(),
            interface: interface.to_owned(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Handle to the same object through another interface
    pub fn with_interface(&self, interface: &str) -> RemoteObject {
        Self {
            connection: self.connection.clone(),
            path: self.path.clone(),
            interface: interface.to_owned(),
        }
    }

    /// Invoke a method, resolving its first return value
    pub async fn call(&self, member: &str, args: Vec<Bson>) -> crate::Result<Bson> {
        self.connection
            .call(&self.path, &self.interface, member, args)
            .await
    }

    /// Invoke a method and deserialize the result
    pub async fn call_typed<R: DeserializeOwned>(
        &self,
        member: &str,
        args: Vec<Bson>,
    ) -> crate::Result<R> {
        let value = self.call(member, args).await?;
        bson::from_bson(value).map_err(|e| Error::ResultType(format!("{member}: {e}")))
    }

    /// Read a property, unwrapping the variant tag
    pub async fn get(&self, name: &str) -> crate::Result<Bson> {
        let reply = self
            .connection
            .call(
                &self.path,
                PROPERTIES_INTERFACE,
                "Get",
                vec![
                    Bson::String(self.interface.clone()),
                    Bson::String(name.to_owned()),
                ],
            )
            .await?;

        let variant: Variant = bson::from_bson(reply)
            .map_err(|e| Error::ResultType(format!("property `{name}`: {e}")))?;

        Ok(variant.value)
    }

    /// Read a property and deserialize its value
    pub async fn get_typed<R: DeserializeOwned>(&self, name: &str) -> crate::Result<R> {
        let value = self.get(name).await?;
        bson::from_bson(value).map_err(|e| Error::ResultType(format!("property `{name}`: {e}")))
    }

    /// Write a property. The value carries its wire signature explicitly
    pub async fn set(&self, name: &str, value: Variant) -> crate::Result<()> {
        let value = bson::to_bson(&value).map_err(|e| Error::ParamsType(e.to_string()))?;

        self.connection
            .call(
                &self.path,
                PROPERTIES_INTERFACE,
                "Set",
                vec![
                    Bson::String(self.interface.clone()),
                    Bson::String(name.to_owned()),
                    value,
                ],
            )
            .await?;

        Ok(())
    }
}
