//! Users service client: user and root account configuration.

use std::sync::Arc;

use bson::Document;

use groundwork_rpc::variant::{encode_map, variant};

use crate::{connection::Connection, crypt, proxy::RemoteObject, registry::Service};

#[derive(Clone)]
pub struct UsersClient {
    object: RemoteObject,
}

/// Account data collected by the accounts screen, applied in one pass
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    pub full_name: String,
    pub user_name: String,
    pub password: String,
    pub is_root_enabled: bool,
    pub root_password: String,
    pub skip_account_creation: bool,
}

impl UsersClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        let object = RemoteObject::new(
            connection,
            Service::Users.object_path(),
            Service::Users.interface_name(),
        );

        Self { object }
    }

    /// Write the user records
    pub async fn set_users(&self, users: Vec<Document>) -> crate::Result<()> {
        self.object.set("Users", variant("aa{sv}", users)).await
    }

    pub async fn set_is_root_account_locked(&self, locked: bool) -> crate::Result<()> {
        self.object
            .set("IsRootAccountLocked", variant("b", locked))
            .await
    }

    /// Write an already crypted root password
    pub async fn set_crypted_root_password(&self, password: &str) -> crate::Result<()> {
        self.object
            .call("SetCryptedRootPassword", vec![password.into()])
            .await?;

        Ok(())
    }

    pub async fn clear_root_password(&self) -> crate::Result<()> {
        self.object.call("ClearRootPassword", vec![]).await?;

        Ok(())
    }

    pub async fn guess_username_from_full_name(&self, full_name: &str) -> crate::Result<String> {
        self.object
            .call_typed("GuessUsernameFromFullName", vec![full_name.into()])
            .await
    }

    /// Apply the account configuration. Passwords are crypted through the
    /// system hasher before anything is sent to the backend
    pub async fn apply_accounts(&self, accounts: &Accounts) -> crate::Result<()> {
        if accounts.skip_account_creation {
            self.set_users(Vec::new()).await?;
        } else {
            let crypted = crypt::crypt_password(&accounts.password).await?;
            self.set_users(vec![user_record(accounts, &crypted)?])
                .await?;
        }

        self.set_is_root_account_locked(!accounts.is_root_enabled)
            .await?;

        if accounts.is_root_enabled {
            let crypted = crypt::crypt_password(&accounts.root_password).await?;
            self.set_crypted_root_password(&crypted).await?;
        } else {
            self.clear_root_password().await?;
        }

        Ok(())
    }
}

fn user_record(accounts: &Accounts, crypted_password: &str) -> crate::Result<Document> {
    let mut fields = Document::new();
    fields.insert("gecos", accounts.full_name.as_str());
    fields.insert("groups", vec!["wheel".to_owned()]);
    fields.insert("is-crypted", true);
    fields.insert("name", accounts.user_name.as_str());
    fields.insert("password", crypted_password);

    encode_map(fields)
}
