//! App-specific configuration extensions.
//!
//! This module provides hotkey parsing on top of the core Config.

use std::str::FromStr;
use std::sync::Arc;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use parking_lot::RwLock;
use tracing::warn;

use crate::Config;

/// Default hotkey: Meta+Shift+Semicolon
pub fn default_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::META | Modifiers::SHIFT), Code::Semicolon)
}

/// Extension trait for Config to handle hotkeys.
pub trait ConfigExt {
    /// The push-to-talk hotkey, parsed from config or the default.
    fn hotkey(&self) -> HotKey;
}

impl ConfigExt for Config {
    fn hotkey(&self) -> HotKey {
        match self.hotkey.as_deref() {
            None => default_hotkey(),
            Some(raw) => match HotKey::from_str(raw) {
                Ok(hotkey) => hotkey,
                Err(err) => {
                    warn!(hotkey = raw, error = %err, "invalid hotkey in config, using default");
                    default_hotkey()
                }
            },
        }
    }
}

impl ConfigExt for Arc<RwLock<Config>> {
    fn hotkey(&self) -> HotKey {
        self.read().hotkey()
    }
}
