//! Capabilities offered to user extensions.
//!
//! An [`ExtensionApi`] is built once at startup and handed by reference to
//! the init-file loader and to the shell. Keybindings and toasts registered
//! before a shell is attached are queued and flushed on [`ExtensionApi::attach`].

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info};
use serde::Deserialize;

use crate::{Action, Keymap, PinError, Result};

pub const DEFAULT_TOAST_TIMEOUT_MS: u64 = 2000;

/// A transient message for the shell to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct ExtensionApi {
    file_path: PathBuf,
    attached: bool,
    pending_keybindings: Vec<(String, Action)>,
    keybindings: Vec<(String, Action)>,
    toasts: Vec<Toast>,
}

impl ExtensionApi {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            attached: false,
            pending_keybindings: Vec::new(),
            keybindings: Vec::new(),
            toasts: Vec::new(),
        }
    }

    /// Path of the open note file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Queues a toast for the shell.
    pub fn toast(&mut self, message: impl Into<String>, timeout_ms: u64) {
        self.toasts.push(Toast {
            message: message.into(),
            timeout: Duration::from_millis(timeout_ms),
        });
    }

    /// Registers a keybinding, applied when the shell attaches.
    pub fn add_keybinding(&mut self, key: impl Into<String>, action: Action) {
        let key = key.into();
        debug!("Extension keybinding {} -> {:?}", key, action);
        if self.attached {
            self.keybindings.push((key, action));
        } else {
            self.pending_keybindings.push((key, action));
        }
    }

    /// Marks the shell ready and moves queued keybindings into `keymap`.
    pub fn attach(&mut self, keymap: &mut Keymap) {
        self.attached = true;
        self.keybindings.append(&mut self.pending_keybindings);
        self.flush_keybindings(keymap);
    }

    /// Applies keybindings registered since the last flush.
    pub fn flush_keybindings(&mut self, keymap: &mut Keymap) {
        for (key, action) in self.keybindings.drain(..) {
            keymap.bind(&key, action);
        }
    }

    /// Hands queued toasts to the shell.
    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InitFile {
    #[serde(default)]
    keybindings: BTreeMap<String, Action>,
    #[serde(default)]
    toast: Option<InitToast>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InitToast {
    message: String,
    #[serde(default = "default_toast_timeout")]
    timeout_ms: u64,
}

fn default_toast_timeout() -> u64 {
    DEFAULT_TOAST_TIMEOUT_MS
}

/// Runs the user's init file against `api`.
///
/// Returns false if there is no init file.
pub fn load_init_file(path: &Path, api: &mut ExtensionApi) -> Result<bool> {
    if !path.exists() {
        debug!("No init file at {}", path.display());
        return Ok(false);
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(true);
    }
    let init: InitFile = serde_yaml::from_str(&content).map_err(|e| PinError::ConfigError {
        message: format!("{}: {}", path.display(), e),
    })?;

    for (key, action) in init.keybindings {
        api.add_keybinding(key, action);
    }
    if let Some(toast) = init.toast {
        api.toast(toast.message, toast.timeout_ms);
    }

    info!("Loaded init file {}", path.display());
    Ok(true)
}
