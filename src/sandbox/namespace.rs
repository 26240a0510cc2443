//! The virtual namespace: the global layer hosted code runs against inside a
//! sandbox.
//!
//! Reads resolve, first match wins: identity names, the sandbox-aware
//! `hasOwnProperty`, the private container, the injection overlay, then the
//! host global (with callables normalized). Writes are classified as added or
//! overridden, mirrored to the host in single-instance mode and always land in
//! the container.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};

use crate::runner::ds::env_record::GlobalBindings;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::{get, has_property};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::host::types::{BuiltInFn, EvalContext};
use crate::runner::host::HostEnvironment;
use crate::sandbox::config::{CallableClassification, IDENTITY_NAMES};
use crate::sandbox::normalizer;
use crate::sandbox::tracker::{install_hijacks, RegistrationLedger, SharedLedger};

const HAS_OWN_PROPERTY: &str = "hasOwnProperty";

pub type Injection = BTreeMap<String, JsValue>;

pub struct VirtualNamespace {
    id: String,
    host: Rc<HostEnvironment>,
    multi_mode: bool,
    classification: CallableClassification,
    container: JsObjectType,
    overlay: Injection,
    added: RefCell<BTreeMap<String, JsValue>>,
    original: RefCell<BTreeMap<String, JsValue>>,
    ledger: SharedLedger,
    /// The object hosted code sees as `window`; routes back here.
    reference: JsObjectType,
    has_own: JsValue,
}

impl VirtualNamespace {
    pub fn new(
        id: &str,
        host: &Rc<HostEnvironment>,
        multi_mode: bool,
        classification: CallableClassification,
        overlay: Injection,
    ) -> Rc<Self> {
        let container = new_object(ObjectKind::Ordinary, None);
        let ledger: SharedLedger = Rc::new(RefCell::new(RegistrationLedger::new()));
        install_hijacks(&container, host, &ledger);
        let has_own = sandbox_has_own_property(host, &container);
        Rc::new_cyclic(|me: &Weak<VirtualNamespace>| {
            let me: Weak<dyn GlobalBindings> = me.clone();
            let reference = new_object(
                ObjectKind::Namespace(me),
                Some(host.intrinsics().object_prototype.clone()),
            );
            debug!(
                "[sandbox {}] namespace created (multi mode: {}, overlay: {} name(s))",
                id,
                multi_mode,
                overlay.len()
            );
            VirtualNamespace {
                id: id.to_string(),
                host: host.clone(),
                multi_mode,
                classification,
                container,
                overlay,
                added: RefCell::new(BTreeMap::new()),
                original: RefCell::new(BTreeMap::new()),
                ledger,
                reference,
                has_own,
            }
        })
    }

    pub fn is_multi_mode(&self) -> bool {
        self.multi_mode
    }

    /// Names written here that the host did not have at first write.
    pub fn added_bindings(&self) -> BTreeMap<String, JsValue> {
        self.added.borrow().clone()
    }

    /// Host values captured right before the first overwrite of each name.
    pub fn original_values(&self) -> BTreeMap<String, JsValue> {
        self.original.borrow().clone()
    }

    pub fn ledger(&self) -> RegistrationLedger {
        self.ledger.borrow().clone()
    }

    /// Value held by the private container, `undefined` counting as absent.
    pub fn container_value(&self, name: &str) -> Option<JsValue> {
        self.container
            .borrow()
            .get_own_property(name)
            .map(|d| d.value.clone())
            .filter(|v| !v.is_undefined())
    }

    fn contains(&self, name: &str) -> bool {
        self.container.borrow().has_own_property(name)
    }

    /// Records which ledger `name` belongs to. A name lands in exactly one of
    /// them and only its first overwrite of a host value is captured.
    fn classify_write(&self, name: &str, value: &JsValue) {
        let mut added = self.added.borrow_mut();
        if added.contains_key(name) {
            added.insert(name.to_string(), value.clone());
        } else if !self.host.has(name) {
            trace!("[sandbox {}] '{}' is a new binding", self.id, name);
            added.insert(name.to_string(), value.clone());
        } else {
            let mut original = self.original.borrow_mut();
            if !original.contains_key(name) {
                let previous = self.host.get(name).unwrap_or(JsValue::Undefined);
                trace!("[sandbox {}] '{}' overrides host value {}", self.id, name, previous);
                original.insert(name.to_string(), previous);
            }
        }
    }

    /// Replays the ledger, restores overridden host bindings and deletes added
    /// ones. Stops at the first restoration failure.
    pub fn teardown(&self) -> Result<(), JErrorType> {
        self.ledger.borrow().replay_teardown(&self.host);
        for (name, value) in self.original.borrow().iter() {
            if self.host.get(name).as_ref() == Some(value) {
                continue;
            }
            trace!("[sandbox {}] restoring '{}'", self.id, name);
            self.host.set(name, value.clone())?;
        }
        for name in self.added.borrow().keys() {
            trace!("[sandbox {}] deleting '{}'", self.id, name);
            self.host.delete(name)?;
        }
        Ok(())
    }
}

/// `hasOwnProperty` as seen from inside the sandbox: true for names the
/// sandbox holds a value for or that the host global owns.
fn sandbox_has_own_property(host: &Rc<HostEnvironment>, container: &JsObjectType) -> JsValue {
    let container = container.clone();
    let host_ref = Rc::downgrade(host);
    let func = BuiltInFn::Closure(Rc::new(
        move |_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| -> Result<JsValue, JErrorType> {
            let name = to_string(&args.get(0).cloned().unwrap_or(JsValue::Undefined));
            let in_container = container
                .borrow()
                .get_own_property(&name)
                .map_or(false, |d| !d.value.is_undefined());
            let on_host = host_ref.upgrade().map_or(false, |h| h.has(&name));
            Ok(JsValue::Boolean(in_container || on_host))
        },
    ));
    host.intrinsics().new_native_function(HAS_OWN_PROPERTY, func, false)
}

impl GlobalBindings for VirtualNamespace {
    fn has_binding(&self, name: &str) -> bool {
        IDENTITY_NAMES.contains(name) || self.overlay.contains_key(name) || self.has_property(name)
    }

    fn has_property(&self, name: &str) -> bool {
        self.contains(name) || has_property(&self.host.global(), name).unwrap_or(false)
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        if IDENTITY_NAMES.contains(name) {
            return Ok(self.reference());
        }
        if name == HAS_OWN_PROPERTY {
            return Ok(self.has_own.clone());
        }
        if let Some(v) = self.container_value(name) {
            return Ok(v);
        }
        if let Some(v) = self.overlay.get(name) {
            if to_boolean(v) {
                return Ok(v.clone());
            }
        }
        let value = get(&self.host.global_object(), name)?;
        Ok(normalizer::normalize(name, value, &self.host, &self.classification))
    }

    fn set_mutable_binding(&self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.classify_write(name, &value);
        if !self.multi_mode {
            if let Err(e) = self.host.set(name, value.clone()) {
                warn!("[sandbox {}] could not mirror '{}' to the host: {}", self.id, name, e);
            }
        }
        self.container.borrow_mut().put(name, value);
        Ok(())
    }

    /// Deletes only from the container. In single-instance mode a binding this
    /// sandbox added is also removed from the host.
    fn delete_binding(&self, name: &str) -> Result<bool, JErrorType> {
        self.container.borrow_mut().remove_own_property(name);
        if !self.multi_mode && self.added.borrow().contains_key(name) {
            self.host.delete(name)?;
        }
        Ok(true)
    }

    fn own_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keys = vec![];
        let host_keys = self.host.global_object().borrow().own_enumerable_keys();
        for k in self.container.borrow().own_enumerable_keys().into_iter().chain(host_keys) {
            if seen.insert(k.clone()) {
                keys.push(k);
            }
        }
        keys
    }

    fn reference(&self) -> JsValue {
        JsValue::Object(self.reference.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace(host: &Rc<HostEnvironment>, multi_mode: bool) -> Rc<VirtualNamespace> {
        VirtualNamespace::new("test", host, multi_mode, CallableClassification::new(), Injection::new())
    }

    #[test]
    fn test_identity_names_return_reference() {
        let host = HostEnvironment::new();
        let ns = namespace(&host, true);
        for name in ["window", "self", "top", "globalThis"].iter() {
            let v = ns.get_binding_value(name).unwrap();
            assert_eq!(v, ns.reference());
            assert!(!host.is_global(&v));
        }
    }

    #[test]
    fn test_first_write_classifies_new_binding() {
        let host = HostEnvironment::new();
        let ns = namespace(&host, false);
        ns.set_mutable_binding("counter", JsValue::integer(1)).unwrap();
        ns.set_mutable_binding("counter", JsValue::integer(2)).unwrap();
        assert_eq!(ns.added_bindings().get("counter"), Some(&JsValue::integer(2)));
        assert!(ns.original_values().is_empty());
        assert_eq!(host.get("counter"), Some(JsValue::integer(2)));
    }

    #[test]
    fn test_first_overwrite_captures_host_value() {
        let host = HostEnvironment::new();
        host.set("title", JsValue::string("Host")).unwrap();
        let ns = namespace(&host, false);
        ns.set_mutable_binding("title", JsValue::string("A")).unwrap();
        ns.set_mutable_binding("title", JsValue::string("B")).unwrap();
        assert_eq!(ns.original_values().get("title"), Some(&JsValue::string("Host")));
        assert!(ns.added_bindings().is_empty());
    }

    #[test]
    fn test_multi_mode_does_not_mirror() {
        let host = HostEnvironment::new();
        let ns = namespace(&host, true);
        ns.set_mutable_binding("counter", JsValue::integer(1)).unwrap();
        assert!(!host.has("counter"));
        assert_eq!(ns.get_binding_value("counter").unwrap(), JsValue::integer(1));
    }

    #[test]
    fn test_mirror_failure_still_writes_container() {
        let host = HostEnvironment::new();
        host.define_readonly("VERSION", JsValue::integer(1));
        let ns = namespace(&host, false);
        assert!(ns.set_mutable_binding("VERSION", JsValue::integer(2)).is_ok());
        assert_eq!(ns.get_binding_value("VERSION").unwrap(), JsValue::integer(2));
        assert_eq!(host.get("VERSION"), Some(JsValue::integer(1)));
    }

    #[test]
    fn test_falsy_container_values_win() {
        let host = HostEnvironment::new();
        host.set("flag", JsValue::Boolean(true)).unwrap();
        let ns = namespace(&host, true);
        for v in [JsValue::integer(0), JsValue::string(""), JsValue::Boolean(false), JsValue::Null].iter() {
            ns.set_mutable_binding("flag", v.clone()).unwrap();
            assert_eq!(&ns.get_binding_value("flag").unwrap(), v);
        }
    }

    #[test]
    fn test_overlay_only_when_truthy() {
        let host = HostEnvironment::new();
        host.set("mode", JsValue::string("host")).unwrap();
        let mut overlay = Injection::new();
        overlay.insert("appName".to_string(), JsValue::string("guest"));
        overlay.insert("mode".to_string(), JsValue::integer(0));
        let ns = VirtualNamespace::new("test", &host, true, CallableClassification::new(), overlay);
        assert_eq!(ns.get_binding_value("appName").unwrap(), JsValue::string("guest"));
        assert!(ns.has_binding("appName"));
        assert_eq!(ns.get_binding_value("mode").unwrap(), JsValue::string("host"));
    }

    #[test]
    fn test_teardown_restores_and_deletes() {
        let host = HostEnvironment::new();
        host.set("title", JsValue::string("Host")).unwrap();
        let ns = namespace(&host, false);
        ns.set_mutable_binding("title", JsValue::string("Guest")).unwrap();
        ns.set_mutable_binding("counter", JsValue::integer(1)).unwrap();
        ns.teardown().unwrap();
        assert_eq!(host.get("title"), Some(JsValue::string("Host")));
        assert!(!host.has("counter"));
    }

    #[test]
    fn test_container_keys_listed_before_host_keys() {
        let host = HostEnvironment::new();
        host.set("hostOnly", JsValue::integer(1)).unwrap();
        let ns = namespace(&host, true);
        ns.set_mutable_binding("mine", JsValue::integer(2)).unwrap();
        let keys = ns.own_keys();
        assert_eq!(keys.first().map(String::as_str), Some("mine"));
        assert!(keys.iter().any(|k| k == "hostOnly"));
    }
}
