//! Typed clients for the backend services.

use bson::Bson;

use groundwork_rpc::Signal;

pub mod boss;
pub mod localization;
pub mod network;
pub mod payloads;
pub mod runtime;
pub mod timezone;
pub mod users;

/// A `PropertiesChanged` payload carries the interface name, the map of
/// changed properties and the invalidated-property list. True if `key`
/// changed on `interface`
pub(crate) fn changed_contains(signal: &Signal, interface: &str, key: &str) -> bool {
    let on_interface =
        matches!(signal.args.first(), Some(Bson::String(name)) if name == interface);
    let has_key =
        matches!(signal.args.get(1), Some(Bson::Document(changed)) if changed.contains_key(key));

    on_interface && has_key
}
