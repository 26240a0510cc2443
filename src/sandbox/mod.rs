//! Global-namespace virtualization for hosted programs.
//!
//! A [`Sandbox`] runs hosted source text against a [`VirtualNamespace`]
//! instead of the host global, records what the program added, overrode and
//! registered, and undoes all of it on [`Sandbox::teardown`].
//!
//! ```
//! use justbox::runner::host::HostEnvironment;
//! use justbox::sandbox::{Sandbox, SandboxOptions};
//!
//! let host = HostEnvironment::new();
//! let mut sandbox = Sandbox::new(&host, SandboxOptions::default());
//! sandbox.execute("counter = 1", None).unwrap();
//! assert!(host.has("counter"));
//! sandbox.teardown().unwrap();
//! assert!(!host.has("counter"));
//! ```

pub mod config;
pub mod error;
pub mod namespace;
pub mod normalizer;
pub mod registry;
pub mod tracker;

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::runner::api::run_script;
use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::value::JsValue;
use crate::runner::host::HostEnvironment;

pub use self::config::{CallableClassification, Classification, SandboxOptions};
pub use self::error::SandboxError;
pub use self::namespace::{Injection, VirtualNamespace};
pub use self::registry::SandboxRegistry;
pub use self::tracker::RegistrationLedger;

use self::config::json_to_js;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    /// Created, nothing executed yet.
    Uninitialized,
    Active,
    /// Torn down. A fresh sandbox is needed to run more code.
    Inert,
}

pub struct Sandbox {
    id: String,
    host: Rc<HostEnvironment>,
    options: SandboxOptions,
    state: SandboxState,
    /// Set when the host cannot intercept global access; nothing is executed.
    disabled: bool,
    namespace: Option<Rc<VirtualNamespace>>,
}

impl Sandbox {
    pub fn new(host: &Rc<HostEnvironment>, options: SandboxOptions) -> Self {
        let id = Uuid::new_v4().to_string();
        let disabled = !host.capabilities().interception;
        if disabled {
            warn!(
                "[sandbox {}] host does not support interception, sandbox disabled",
                id
            );
        }
        debug!("[sandbox {}] created (multi mode: {})", id, options.multi_mode);
        Sandbox {
            id,
            host: host.clone(),
            options,
            state: SandboxState::Uninitialized,
            disabled,
            namespace: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SandboxState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    pub fn host(&self) -> &Rc<HostEnvironment> {
        &self.host
    }

    /// Runs `source` with the virtual namespace as the global scope and returns
    /// the completion value of its last statement. The namespace, and with it
    /// the injection overlay, is built on the first call. Evaluation errors are
    /// logged and returned unchanged inside [`SandboxError::Evaluation`].
    pub fn execute(&mut self, source: &str, injection: Option<Injection>) -> Result<JsValue, SandboxError> {
        if self.state == SandboxState::Inert {
            return Err(SandboxError::Inert(self.id.to_string()));
        }
        if self.disabled {
            debug!("[sandbox {}] disabled, skipping execution", self.id);
            return Ok(JsValue::Undefined);
        }
        let global: Rc<dyn GlobalBindings> = self.namespace_or_build(injection);
        self.state = SandboxState::Active;
        run_script(&self.host, global, source).map_err(|e| {
            error!("[sandbox {}] error while executing hosted script: {}", self.id, e);
            SandboxError::Evaluation(e)
        })
    }

    fn namespace_or_build(&mut self, injection: Option<Injection>) -> Rc<VirtualNamespace> {
        if let Some(ns) = &self.namespace {
            if injection.is_some() {
                debug!("[sandbox {}] namespace already built, ignoring injection", self.id);
            }
            return ns.clone();
        }
        let mut overlay: Injection = self
            .options
            .injection
            .iter()
            .map(|(k, v)| (k.to_string(), json_to_js(v, self.host.intrinsics())))
            .collect();
        overlay.extend(injection.unwrap_or_default());
        let ns = VirtualNamespace::new(
            &self.id,
            &self.host,
            self.options.multi_mode,
            self.options.classification.clone(),
            overlay,
        );
        self.namespace = Some(ns.clone());
        ns
    }

    /// The live namespace object hosted code sees as `window`.
    pub fn namespace(&self) -> Option<JsValue> {
        self.namespace.as_ref().map(|ns| ns.reference())
    }

    pub fn virtual_namespace(&self) -> Option<&Rc<VirtualNamespace>> {
        self.namespace.as_ref()
    }

    pub fn added_bindings(&self) -> BTreeMap<String, JsValue> {
        self.namespace
            .as_ref()
            .map(|ns| ns.added_bindings())
            .unwrap_or_default()
    }

    pub fn original_values(&self) -> BTreeMap<String, JsValue> {
        self.namespace
            .as_ref()
            .map(|ns| ns.original_values())
            .unwrap_or_default()
    }

    pub fn ledger(&self) -> RegistrationLedger {
        self.namespace
            .as_ref()
            .map(|ns| ns.ledger())
            .unwrap_or_default()
    }

    /// Removes tracked listeners, cancels tracked timers, restores overridden
    /// host bindings and deletes added ones. The sandbox is inert afterwards,
    /// even when restoration fails. Calling it again does nothing.
    pub fn teardown(&mut self) -> Result<(), SandboxError> {
        if self.state == SandboxState::Inert {
            return Ok(());
        }
        self.state = SandboxState::Inert;
        let ns = match (&self.namespace, self.disabled) {
            (Some(ns), false) => ns,
            _ => {
                debug!("[sandbox {}] nothing to tear down", self.id);
                return Ok(());
            }
        };
        ns.teardown().map_err(|e| {
            error!("[sandbox {}] teardown failed: {}", self.id, e);
            SandboxError::Teardown(e)
        })?;
        info!(
            "[sandbox {}] torn down ({} added, {} restored)",
            self.id,
            ns.added_bindings().len(),
            ns.original_values().len()
        );
        Ok(())
    }
}
