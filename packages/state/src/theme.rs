//! Dark/light preference persisted under the `theme` key.

use std::fmt;

use store::{KeyValueStore, THEME_KEY};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a stored value; anything but `dark`/`light` is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme plus its durable copy.
#[derive(Debug)]
pub struct ThemeStore<S> {
    storage: S,
    is_dark_mode: bool,
}

impl<S: KeyValueStore> ThemeStore<S> {
    /// Starts in light mode until [`initialize`](Self::initialize) runs.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            is_dark_mode: false,
        }
    }

    /// Restore the stored preference, falling back to (and persisting) the
    /// system one. Returns the resulting dark-mode flag.
    pub fn initialize(&mut self, system_prefers_dark: bool) -> bool {
        let stored = match self.storage.get(THEME_KEY) {
            Ok(value) => value.as_deref().and_then(Theme::parse),
            Err(e) => {
                warn!("Failed to read theme preference: {e}");
                None
            }
        };
        match stored {
            Some(theme) => self.is_dark_mode = theme == Theme::Dark,
            None => self.set_dark_mode(system_prefers_dark),
        }
        self.is_dark_mode
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.is_dark_mode = dark;
        if let Err(e) = self.storage.set(THEME_KEY, Theme::from_dark_mode(dark).as_str()) {
            warn!("Failed to persist theme preference: {e}");
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.set_dark_mode(!self.is_dark_mode);
        self.is_dark_mode
    }

    /// The OS switched themes; follow it.
    pub fn system_preference_changed(&mut self, prefers_dark: bool) {
        self.set_dark_mode(prefers_dark);
    }

    pub fn is_dark_mode(&self) -> bool {
        self.is_dark_mode
    }

    pub fn theme(&self) -> Theme {
        Theme::from_dark_mode(self.is_dark_mode)
    }
}
