//! Timezone service client: timezone, hardware clock and time sources.

use std::sync::Arc;

use bson::{Bson, Document};

use groundwork_rpc::variant::{encode_map, variant};

use crate::{connection::Connection, proxy::RemoteObject, registry::Service, task::run_task};

/// Priority the backend assigns to an explicit user action
const USER_PRIORITY: i32 = 90;

#[derive(Clone)]
pub struct TimezoneClient {
    object: RemoteObject,
}

impl TimezoneClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        let object = RemoteObject::new(
            connection,
            Service::Timezone.object_path(),
            Service::Timezone.interface_name(),
        );

        Self { object }
    }

    /// The current timezone, e.g. `Europe/Prague`
    pub async fn get_timezone(&self) -> crate::Result<String> {
        self.object.get_typed("Timezone").await
    }

    /// Set the timezone as a user action
    pub async fn set_timezone(&self, timezone: &str) -> crate::Result<()> {
        self.set_timezone_with_priority(timezone, USER_PRIORITY)
            .await
    }

    pub async fn set_timezone_with_priority(
        &self,
        timezone: &str,
        priority: i32,
    ) -> crate::Result<()> {
        self.object
            .call(
                "SetTimezoneWithPriority",
                vec![timezone.into(), priority.into()],
            )
            .await?;

        Ok(())
    }

    /// All valid timezones, grouped by region
    pub async fn get_all_valid_timezones(&self) -> crate::Result<Document> {
        self.object.call_typed("GetAllValidTimezones", vec![]).await
    }

    /// True if the hardware clock is set to UTC
    pub async fn get_is_utc(&self) -> crate::Result<bool> {
        self.object.get_typed("IsUTC").await
    }

    pub async fn set_is_utc(&self, is_utc: bool) -> crate::Result<()> {
        self.object.set("IsUTC", variant("b", is_utc)).await
    }

    pub async fn get_ntp_enabled(&self) -> crate::Result<bool> {
        self.object.get_typed("NTPEnabled").await
    }

    pub async fn set_ntp_enabled(&self, enabled: bool) -> crate::Result<()> {
        self.object.set("NTPEnabled", variant("b", enabled)).await
    }

    /// Configured NTP/time sources, in their wire structure
    pub async fn get_time_sources(&self) -> crate::Result<Vec<Document>> {
        self.object.get_typed("TimeSources").await
    }

    pub async fn set_time_sources(&self, sources: Vec<Document>) -> crate::Result<()> {
        self.object
            .set("TimeSources", variant("aa{sv}", sources))
            .await
    }

    /// Append one custom NTP source to the configured list
    pub async fn add_time_source(
        &self,
        hostname: &str,
        is_pool: bool,
        options: &[String],
    ) -> crate::Result<()> {
        let mut sources = self.get_time_sources().await?;
        sources.push(time_source(hostname, is_pool, options)?);

        self.set_time_sources(sources).await
    }

    /// NTP servers listed in the time daemon configuration file
    pub async fn get_time_servers_from_config(&self) -> crate::Result<Vec<Document>> {
        self.object.get_typed("TimeServersFromConfig").await
    }

    /// The current local date and time as an ISO8601 string
    pub async fn get_system_date_time(&self) -> crate::Result<String> {
        self.object.call_typed("GetSystemDateTime", vec![]).await
    }

    pub async fn set_system_date_time(&self, date_time_spec: &str) -> crate::Result<()> {
        self.object
            .call("SetSystemDateTime", vec![date_time_spec.into()])
            .await?;

        Ok(())
    }

    /// Check whether the NTP server at `hostname` is reachable
    pub async fn check_ntp_server(&self, hostname: &str, is_nts: bool) -> crate::Result<bool> {
        self.object
            .call_typed("CheckNTPServer", vec![hostname.into(), is_nts.into()])
            .await
    }

    /// Run the geolocation task to completion
    pub async fn run_geolocation(&self) -> crate::Result<Bson> {
        run_task(&self.object, "StartGeolocationWithTask").await
    }

    /// Geolocation result data, if a task has produced any
    pub async fn get_geolocation_result(&self) -> crate::Result<Document> {
        self.object.get_typed("GeolocationResult").await
    }

    pub fn object(&self) -> &RemoteObject {
        &self.object
    }
}

/// Make a time-source wire structure out of `sources` field values.
/// Used when replacing the whole list from screen state
pub fn time_source(hostname: &str, is_pool: bool, options: &[String]) -> crate::Result<Document> {
    let mut fields = Document::new();
    fields.insert("hostname", hostname);
    fields.insert("options", options.to_vec());
    fields.insert("type", if is_pool { "POOL" } else { "NTP" });

    encode_map(fields)
}
