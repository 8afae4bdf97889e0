//! Persisted UI state: namespaced `get_state`/`set_state` over browser
//! storage.
//!
//! The canonical backend is the browser's local storage. The cookie-backed
//! [`CookieStore`] is the legacy compat path kept behind the same trait so
//! older deployments can swap it in without touching the controller.

use std::collections::BTreeMap;

/// Prefix applied to every persisted key so the report does not collide
/// with other pages served from the same origin.
pub const NAMESPACE: &str = "skyreport";

/// How long legacy cookies live, in seconds (one year).
#[cfg(target_arch = "wasm32")]
const COOKIE_MAX_AGE: u32 = 365 * 24 * 3600;

pub fn scoped(key: &str) -> String {
    format!("{NAMESPACE}.{key}")
}

/// Keyed persistence for UI selections. `get_state` yields the default
/// exactly when the key was never set or was cleared.
pub trait StateStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: &str);

    fn get_state(&self, key: &str, default: &str) -> String {
        match self.get_raw(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    fn set_state(&mut self, key: &str, value: &str) {
        self.set_raw(key, value);
    }
}

/// In-memory store used by unit tests and native builds.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

impl StateStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Browser local storage, namespaced. All operations are best-effort: a
/// denied or absent storage area reads as empty and swallows writes.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl StateStore for LocalStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(&scoped(key)).ok()?
    }

    fn set_raw(&mut self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(&scoped(key), value);
        }
    }
}

/// Legacy cookie persistence: namespaced, expiring, scoped to the site
/// root. Kept for deployments that predate local storage.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone)]
pub struct CookieStore;

#[cfg(target_arch = "wasm32")]
impl CookieStore {
    fn document() -> Option<web_sys::HtmlDocument> {
        use wasm_bindgen::JsCast;
        web_sys::window()?.document()?.dyn_into().ok()
    }
}

#[cfg(target_arch = "wasm32")]
impl StateStore for CookieStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        let cookies = Self::document()?.cookie().ok()?;
        let wanted = scoped(key);
        for pair in cookies.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if name == wanted {
                return Some(value.to_string());
            }
        }
        None
    }

    fn set_raw(&mut self, key: &str, value: &str) {
        if let Some(document) = Self::document() {
            let cookie = format!(
                "{}={value}; max-age={COOKIE_MAX_AGE}; path=/",
                scoped(key)
            );
            let _ = document.set_cookie(&cookie);
        }
    }
}

/// The store the views instantiate on each platform.
#[cfg(target_arch = "wasm32")]
pub type ActiveStore = LocalStore;
#[cfg(not(target_arch = "wasm32"))]
pub type ActiveStore = MemoryStore;
