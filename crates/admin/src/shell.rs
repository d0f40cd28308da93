//! Layout shell state shared by every admin page.

use serde::{Deserialize, Serialize};

const PREFS_KEY: &str = "chispa.admin.ui";

/// Key-value persistence for operator UI preferences.
///
/// The host maps this onto whatever survives a reload on its side, such
/// as browser local storage or a config file next to the binary.
pub trait PreferenceStore {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Persist `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);
}

/// UI preferences persisted across admin sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    /// Whether the navigation sidebar is collapsed to icons.
    pub sidebar_collapsed: bool,
}

impl UiPreferences {
    /// Load preferences from the store. Missing or corrupt entries fall
    /// back to the defaults instead of failing the shell.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        store
            .get(PREFS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn save(self, store: &mut dyn PreferenceStore) {
        if let Ok(raw) = serde_json::to_string(&self) {
            store.set(PREFS_KEY, &raw);
        }
    }
}

/// Chrome around the admin pages: navigation sidebar and the preference
/// plumbing behind it.
pub struct AdminShell<'a> {
    store: &'a mut dyn PreferenceStore,
    prefs: UiPreferences,
}

impl<'a> AdminShell<'a> {
    /// Build the shell, restoring any persisted preferences.
    pub fn new(store: &'a mut dyn PreferenceStore) -> Self {
        let prefs = UiPreferences::load(store);
        Self { store, prefs }
    }

    /// Flip the sidebar between expanded and collapsed, persisting the
    /// choice for the next session.
    pub fn toggle_sidebar(&mut self) {
        self.prefs.sidebar_collapsed = !self.prefs.sidebar_collapsed;
        self.prefs.save(self.store);
    }

    #[must_use]
    pub const fn sidebar_collapsed(&self) -> bool {
        self.prefs.sidebar_collapsed
    }
}
