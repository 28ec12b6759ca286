//! Theme, display preferences and feature toggles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{load_or_default, persist, StateStorage};

pub const PREFERENCES_KEY: &str = "weather-preferences";
pub const DEFAULT_LANGUAGE: &str = "es";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Auto,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub units: Units,
    pub language: String,
    pub auto_refresh: bool,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            units: Units::Metric,
            language: DEFAULT_LANGUAGE.to_string(),
            auto_refresh: true,
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    pub maps_enabled: bool,
    pub charts_enabled: bool,
    pub alerts_enabled: bool,
    pub offline_mode: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            maps_enabled: true,
            charts_enabled: true,
            alerts_enabled: true,
            offline_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Maps,
    Charts,
    Alerts,
    OfflineMode,
}

impl std::str::FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maps" => Ok(Self::Maps),
            "charts" => Ok(Self::Charts),
            "alerts" => Ok(Self::Alerts),
            "offline" | "offline-mode" | "offline_mode" => Ok(Self::OfflineMode),
            other => Err(format!("unknown feature: {}", other)),
        }
    }
}

impl Features {
    fn flag_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::Maps => &mut self.maps_enabled,
            Feature::Charts => &mut self.charts_enabled,
            Feature::Alerts => &mut self.alerts_enabled,
            Feature::OfflineMode => &mut self.offline_mode,
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Maps => self.maps_enabled,
            Feature::Charts => self.charts_enabled,
            Feature::Alerts => self.alerts_enabled,
            Feature::OfflineMode => self.offline_mode,
        }
    }
}

/// Partial preference change; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferencesUpdate {
    pub units: Option<Units>,
    pub language: Option<String>,
    pub auto_refresh: Option<bool>,
    pub notifications: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesState {
    pub preferences: Preferences,
    pub features: Features,
    pub theme: Theme,
}

pub struct PreferencesStore {
    storage: Arc<dyn StateStorage>,
    state: PreferencesState,
}

impl std::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PreferencesStore {
    /// Saved values are merged over defaults, so partial documents load.
    pub fn load(storage: Arc<dyn StateStorage>) -> Self {
        let state = load_or_default(storage.as_ref(), PREFERENCES_KEY);
        Self { storage, state }
    }

    pub fn save(&self) -> bool {
        persist(self.storage.as_ref(), PREFERENCES_KEY, &self.state)
    }

    pub fn state(&self) -> &PreferencesState {
        &self.state
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }

    pub fn features(&self) -> &Features {
        &self.state.features
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    /// `Auto` follows the host's dark-mode preference.
    pub fn resolved_theme(&self, system_prefers_dark: bool) -> Theme {
        match self.state.theme {
            Theme::Auto if system_prefers_dark => Theme::Dark,
            Theme::Auto => Theme::Light,
            other => other,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
        self.save();
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        let prefs = &mut self.state.preferences;
        if let Some(units) = update.units {
            prefs.units = units;
        }
        if let Some(language) = update.language {
            prefs.language = language;
        }
        if let Some(auto_refresh) = update.auto_refresh {
            prefs.auto_refresh = auto_refresh;
        }
        if let Some(notifications) = update.notifications {
            prefs.notifications = notifications;
        }
        self.save();
    }

    /// Flip a feature flag and return its new value.
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        let flag = self.state.features.flag_mut(feature);
        *flag = !*flag;
        let enabled = *flag;
        self.save();
        enabled
    }

    pub fn auto_refresh(&self) -> bool {
        self.state.preferences.auto_refresh
    }
}
