//! Derived local state and the dispatcher feeding it.
//!
//! Every refresh action ends in exactly one [StateAction], and every
//! action writes a single named slice. No slice is written by two
//! different refresh kinds, so concurrent refreshes reduce to last write
//! wins.

use std::collections::BTreeMap;

use bson::Document;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use log::warn;

/// Per-language locale bundle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageEntry {
    pub language_data: Document,
    pub locales: Vec<Document>,
}

/// Installable software environment
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Package group visible in an environment
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub is_optional: bool,
}

/// One write to a single named slice of derived state
#[derive(Debug, Clone)]
pub enum StateAction {
    SetLanguage(String),
    SetLanguageData {
        language: String,
        entry: LanguageEntry,
    },
    SetCommonLocales(Vec<String>),
    SetKeyboardLayouts {
        layouts: Vec<Document>,
        selected_layout: String,
        virtual_console_keymap: String,
        x_layouts: Vec<String>,
    },
    SetKeyboardConfiguration(Document),
    SetConnected(bool),
    SetHostname(String),
    SetPasswordPolicies(Document),
    SetPayloadType(String),
    SetEnvironments(Vec<Environment>),
    SetPackagesSelection(Document),
    SetGroups(Vec<Group>),
    SetCriticalError(String),
}

#[derive(Debug, Clone, Default)]
pub struct LocalizationState {
    pub language: String,
    pub common_locales: Vec<String>,
    pub language_data: BTreeMap<String, LanguageEntry>,
    pub keyboard_layouts: Vec<Document>,
    pub selected_layout: String,
    pub virtual_console_keymap: String,
    pub x_layouts: Vec<String>,
    pub keyboard_configuration: Document,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkState {
    pub connected: bool,
    pub hostname: String,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    pub password_policies: Document,
}

#[derive(Debug, Clone, Default)]
pub struct PayloadState {
    pub payload_type: String,
    pub environments: Vec<Environment>,
    pub groups: Vec<Group>,
    pub packages_selection: Document,
}

#[derive(Debug, Clone, Default)]
pub struct MiscState {
    pub critical_error: Option<String>,
}

/// Application-side cache of last-known backend values. Consistent with
/// the backend as of the latest fetch or notification-triggered refresh
#[derive(Debug, Clone, Default)]
pub struct State {
    pub localization: LocalizationState,
    pub network: NetworkState,
    pub runtime: RuntimeState,
    pub payload: PayloadState,
    pub misc: MiscState,
}

impl State {
    /// Apply one slice write. Last write wins
    pub fn apply(&mut self, action: StateAction) {
        match action {
            StateAction::SetLanguage(language) => self.localization.language = language,
            StateAction::SetLanguageData { language, entry } => {
                self.localization.language_data.insert(language, entry);
            }
            StateAction::SetCommonLocales(locales) => self.localization.common_locales = locales,
            StateAction::SetKeyboardLayouts {
                layouts,
                selected_layout,
                virtual_console_keymap,
                x_layouts,
            } => {
                self.localization.keyboard_layouts = layouts;
                self.localization.selected_layout = selected_layout;
                self.localization.virtual_console_keymap = virtual_console_keymap;
                self.localization.x_layouts = x_layouts;
            }
            StateAction::SetKeyboardConfiguration(configuration) => {
                self.localization.keyboard_configuration = configuration
            }
            StateAction::SetConnected(connected) => self.network.connected = connected,
            StateAction::SetHostname(hostname) => self.network.hostname = hostname,
            StateAction::SetPasswordPolicies(policies) => {
                self.runtime.password_policies = policies
            }
            StateAction::SetPayloadType(payload_type) => {
                self.payload.payload_type = payload_type
            }
            StateAction::SetEnvironments(environments) => {
                self.payload.environments = environments
            }
            StateAction::SetPackagesSelection(selection) => {
                self.payload.packages_selection = selection
            }
            StateAction::SetGroups(groups) => self.payload.groups = groups,
            StateAction::SetCriticalError(error) => self.misc.critical_error = Some(error),
        }
    }
}

/// Receiving end of the dispatcher, driving a [State] reducer
pub type StateActions = UnboundedReceiver<StateAction>;

/// Clonable dispatch handle shared by monitors and refresh actions.
/// Dispatching never blocks
#[derive(Clone)]
pub struct Dispatcher {
    tx: UnboundedSender<StateAction>,
}

impl Dispatcher {
    /// A dispatcher and the stream of actions it feeds
    pub fn new() -> (Dispatcher, StateActions) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, action: StateAction) {
        if self.tx.unbounded_send(action).is_err() {
            warn!("State receiver dropped, action discarded")
        }
    }
}
