//! Browser implementations of the platform traits

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Performance, Storage};

use super::{Clock, FrameHandle, FrameScheduler};
use crate::persistence::{KeyValueStore, StorageError};

/// `performance.now()`, falling back to `Date.now()`
pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(performance) => performance.now(),
            None => js_sys::Date::now(),
        }
    }
}

type FrameHandler = Rc<dyn Fn(f64)>;

/// `requestAnimationFrame` scheduler
///
/// The callback is installed after construction with [`set_handler`], since
/// it usually needs the game that owns this scheduler.
///
/// [`set_handler`]: RafScheduler::set_handler
#[derive(Clone, Default)]
pub struct RafScheduler {
    handler: Rc<RefCell<Option<FrameHandler>>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&self, handler: impl Fn(f64) + 'static) {
        *self.handler.borrow_mut() = Some(Rc::new(handler));
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let Some(handler) = self.handler.borrow().clone() else {
            log::warn!("Frame requested before a handler was installed");
            return None;
        };
        let window = web_sys::window()?;
        let closure = Closure::once(move |time: f64| handler(time));
        let id = window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok()?;
        closure.forget();
        Some(FrameHandle(id as u64))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle.0 as i32);
        }
    }
}

/// `window.localStorage`
pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    /// Never fails; an unavailable storage reports errors on use
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, progress will not be saved");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StorageError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage".to_string()))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Quota errors land here
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }
}
