//! Controllers and the registry they are collected into before serving.
//!
//! A [`Registry`] is filled during start-up and then moved into a
//! [`Dispatcher`](crate::Dispatcher), which only ever reads it. Iteration
//! order is registration order; registering a base path again replaces the
//! earlier controller in its slot.

use std::fmt;

use futures_util::future::BoxFuture;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::handler::HandlerRecord;

/// A group of handlers sharing a base path prefix.
#[derive(Debug)]
pub struct ControllerRecord {
    base_path: String,
    handlers: Vec<HandlerRecord>,
}

impl ControllerRecord {
    /// A controller whose handlers are reached under `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            handlers: Vec::new(),
        }
    }

    /// A controller without prefix; it is only consulted while nothing better
    /// has matched, and its patterns see the full request path.
    pub fn catch_all() -> Self {
        Self::new("")
    }

    /// Adds a handler after the ones declared so far.
    pub fn handler(mut self, handler: HandlerRecord) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn handlers(&self) -> &[HandlerRecord] {
        &self.handlers
    }

    pub fn is_catch_all(&self) -> bool {
        self.base_path.is_empty()
    }
}

/// Produces controllers for the registry, e.g. by scanning a plugin directory.
pub trait ControllerLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Vec<ControllerRecord>>>;
}

/// Controllers keyed by base path, in registration order.
#[derive(Default)]
pub struct Registry {
    controllers: Vec<ControllerRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `controller`, replacing any controller with the same base path.
    pub fn register(&mut self, controller: ControllerRecord) {
        info!(
            base_path = controller.base_path(),
            handlers = controller.handlers().len(),
            "registering controller"
        );
        let existing = self
            .controllers
            .iter_mut()
            .find(|c| c.base_path == controller.base_path);
        match existing {
            Some(slot) => {
                warn!(base_path = controller.base_path(), "replacing controller");
                *slot = controller;
            }
            None => self.controllers.push(controller),
        }
    }

    /// Builder form of [`register`](Registry::register).
    pub fn controller(mut self, controller: ControllerRecord) -> Self {
        self.register(controller);
        self
    }

    /// Registers everything `loader` produces.
    ///
    /// A failing loader is logged; controllers registered before stay.
    pub async fn load(&mut self, loader: &dyn ControllerLoader) {
        match loader.load().await {
            Ok(controllers) => self.extend(controllers),
            Err(err) => error!(error = %err, "failed to load controllers"),
        }
    }

    pub fn get(&self, base_path: &str) -> Option<&ControllerRecord> {
        self.controllers.iter().find(|c| c.base_path == base_path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControllerRecord> {
        self.controllers.iter()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl Extend<ControllerRecord> for Registry {
    fn extend<I: IntoIterator<Item = ControllerRecord>>(&mut self, iter: I) {
        for controller in iter {
            self.register(controller);
        }
    }
}

impl FromIterator<ControllerRecord> for Registry {
    fn from_iter<I: IntoIterator<Item = ControllerRecord>>(iter: I) -> Self {
        let mut registry = Registry::new();
        registry.extend(iter);
        registry
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ControllerRecord;
    type IntoIter = std::slice::Iter<'a, ControllerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.controllers.iter().map(ControllerRecord::base_path))
            .finish()
    }
}
