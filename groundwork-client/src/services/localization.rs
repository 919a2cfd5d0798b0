//! Localization service client: language, locale and keyboard state.

use std::{sync::Arc, time::Duration};

use bson::{Bson, Document};
use futures::{future::try_join_all, try_join, StreamExt};
use log::{debug, error};

use groundwork_rpc::{variant::variant, Error, Signal};

use crate::{
    connection::Connection,
    proxy::{RemoteObject, UNKNOWN_METHOD},
    registry::Service,
    services::changed_contains,
    state::{Dispatcher, LanguageEntry, StateAction},
    task::run_task,
};

/// Delay before re-fetching keyboard data after a language change.
/// The backend updates `Language` before the localized keyboard layouts
/// are consistent, so a fetch right after the notification can still
/// observe the previous locale. Do not remove without re-verifying the
/// backend's consistency contract
const DELAYED_REFRESH: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct LocalizationClient {
    object: RemoteObject,
    connection: Arc<Connection>,
    dispatcher: Dispatcher,
}

impl LocalizationClient {
    pub fn new(connection: Arc<Connection>, dispatcher: Dispatcher) -> Self {
        let object = RemoteObject::new(
            connection.clone(),
            Service::Localization.object_path(),
            Service::Localization.interface_name(),
        );

        Self {
            object,
            connection,
            dispatcher,
        }
    }

    pub fn object(&self) -> &RemoteObject {
        &self.object
    }

    /// Start the event monitor and fetch the initial state in its
    /// documented order: language first, then language data, then keyboard
    /// layouts, then keyboard configuration. Later fetches may assume
    /// earlier ones completed
    pub async fn init(&self) -> crate::Result<()> {
        self.start_event_monitor().await;
        self.init_data().await
    }

    async fn init_data(&self) -> crate::Result<()> {
        self.refresh_language().await?;
        self.refresh_languages().await?;
        self.refresh_keyboard_layouts().await?;
        self.refresh_keyboard_configuration().await?;

        Ok(())
    }

    /// Fetch the current language and dispatch it
    pub async fn refresh_language(&self) -> crate::Result<()> {
        let language = self.get_language().await?;
        self.dispatcher.dispatch(StateAction::SetLanguage(language));

        Ok(())
    }

    /// Fetch the language list. Per-language locale data and the common
    /// locales are fetched in parallel
    pub async fn refresh_languages(&self) -> crate::Result<()> {
        let languages = self.get_languages().await?;

        let common = async {
            let locales = self.get_common_locales().await?;
            self.dispatcher
                .dispatch(StateAction::SetCommonLocales(locales));

            Ok::<_, Error>(())
        };
        let data = try_join_all(
            languages
                .iter()
                .map(|language| self.refresh_language_data(language)),
        );

        try_join!(common, data)?;

        Ok(())
    }

    async fn refresh_language_data(&self, language: &str) -> crate::Result<()> {
        let locale_ids = self.get_locales(language).await?;
        let language_data = self.get_language_data(language).await?;
        let locales = try_join_all(locale_ids.iter().map(|locale| self.get_locale_data(locale)))
            .await?;

        self.dispatcher.dispatch(StateAction::SetLanguageData {
            language: language.to_owned(),
            entry: LanguageEntry {
                language_data,
                locales,
            },
        });

        Ok(())
    }

    /// Fetch the keyboard layout list and the related selections
    pub async fn refresh_keyboard_layouts(&self) -> crate::Result<()> {
        let layouts = self.get_keyboard_layouts().await?;
        let selected_layout = self.get_compositor_selected_layout().await?;
        let virtual_console_keymap = self.get_virtual_console_keymap().await?;
        let x_layouts = self.get_x_layouts().await?;

        self.dispatcher.dispatch(StateAction::SetKeyboardLayouts {
            layouts,
            selected_layout,
            virtual_console_keymap,
            x_layouts,
        });

        Ok(())
    }

    /// Run the keyboard configuration task and dispatch its result
    pub async fn refresh_keyboard_configuration(&self) -> crate::Result<()> {
        let result = run_task(&self.object, "GetKeyboardConfigurationWithTask").await?;

        let configuration = match result {
            Bson::Document(configuration) => configuration,
            other => {
                return Err(Error::ResultType(format!("keyboard configuration: {other}")))
            }
        };

        self.dispatcher
            .dispatch(StateAction::SetKeyboardConfiguration(configuration));

        Ok(())
    }

    /// Subscribe to change notifications and keep the localization slices
    /// in step with the backend
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
        match signal.member.as_str() {
            "CompositorSelectedLayoutChanged" | "CompositorLayoutsChanged" => {
                if let Err(e) = self.refresh_keyboard_configuration().await {
                    error!("Keyboard configuration refresh failed: {e}");
                }
            }
            "PropertiesChanged"
                if changed_contains(&signal, Service::Localization.interface_name(), "Language") =>
            {
                if let Err(e) = self.refresh_language().await {
                    error!("Language refresh failed: {e}");
                }
                if let Err(e) = self.refresh_keyboard_configuration().await {
                    error!("Keyboard configuration refresh failed: {e}");
                }

                // Dependent keyboard data is briefly stale on the backend
                // right after a language change. Re-fetch after a fixed delay
                let client = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(DELAYED_REFRESH).await;

                    if let Err(e) = client.refresh_keyboard_configuration().await {
                        error!("Delayed keyboard configuration refresh failed: {e}");
                    }
                    if let Err(e) = client.refresh_keyboard_layouts().await {
                        error!("Delayed keyboard layouts refresh failed: {e}");
                    }
                });
            }
            _ => debug!(
                "Unhandled signal on {}: {}.{} {:?}",
                signal.path, signal.interface, signal.member, signal.args
            ),
        }
    }

    /// Language ids supported by the backend
    pub async fn get_languages(&self) -> crate::Result<Vec<String>> {
        self.object.call_typed("GetLanguages", vec![]).await
    }

    /// The language the installed system will use
    pub async fn get_language(&self) -> crate::Result<String> {
        self.object.get_typed("Language").await
    }

    pub async fn get_language_data(&self, language: &str) -> crate::Result<Document> {
        self.object
            .call_typed("GetLanguageData", vec![language.into()])
            .await
    }

    /// Locale ids of `language`
    pub async fn get_locales(&self, language: &str) -> crate::Result<Vec<String>> {
        self.object
            .call_typed("GetLocales", vec![language.into()])
            .await
    }

    pub async fn get_common_locales(&self) -> crate::Result<Vec<String>> {
        self.object.call_typed("GetCommonLocales", vec![]).await
    }

    pub async fn get_locale_data(&self, locale: &str) -> crate::Result<Document> {
        self.object
            .call_typed("GetLocaleData", vec![locale.into()])
            .await
    }

    pub async fn set_language(&self, language: &str) -> crate::Result<()> {
        self.object.set("Language", variant("s", language)).await
    }

    pub async fn get_x_layouts(&self) -> crate::Result<Vec<String>> {
        self.object.get_typed("XLayouts").await
    }

    pub async fn set_x_layouts(&self, layouts: &[String]) -> crate::Result<()> {
        self.object
            .set("XLayouts", variant("as", layouts.to_vec()))
            .await
    }

    pub async fn get_compositor_selected_layout(&self) -> crate::Result<String> {
        self.object.get_typed("CompositorSelectedLayout").await
    }

    pub async fn get_virtual_console_keymap(&self) -> crate::Result<String> {
        self.object.get_typed("VirtualConsoleKeymap").await
    }

    pub async fn set_compositor_layouts(&self, layouts: &[String]) -> crate::Result<()> {
        self.object
            .call(
                "SetCompositorLayouts",
                vec![layouts.to_vec().into(), Bson::Array(vec![])],
            )
            .await?;

        Ok(())
    }

    /// Locale keyboard list. The method is absent on older backends, which
    /// is detected through the fault name and reported as an empty list.
    /// Any other fault propagates
    pub async fn get_keyboard_layouts(&self) -> crate::Result<Vec<Document>> {
        match self.object.call_typed("GetKeyboardLayouts", vec![]).await {
            Err(Error::Fault { ref name, .. }) if name == UNKNOWN_METHOD => Ok(Vec::new()),
            other => other,
        }
    }

    /// Reset X layouts, then ask the backend to pick defaults. Without the
    /// reset the backend treats existing layouts as explicit configuration
    /// and keeps them
    pub async fn set_x_keyboard_defaults(&self) -> crate::Result<()> {
        self.set_x_layouts(&[]).await?;
        self.object.call("SetXKeyboardDefaults", vec![]).await?;

        Ok(())
    }
}
