//! Lookup of live sandboxes by hosted-application key, owned by whoever
//! orchestrates the hosted applications.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;

use crate::runner::host::HostEnvironment;
use crate::sandbox::{Sandbox, SandboxError, SandboxOptions};

pub type SandboxRef = Rc<RefCell<Sandbox>>;

pub struct SandboxRegistry {
    host: Rc<HostEnvironment>,
    sandboxes: BTreeMap<String, SandboxRef>,
}

impl SandboxRegistry {
    pub fn new(host: &Rc<HostEnvironment>) -> Self {
        SandboxRegistry {
            host: host.clone(),
            sandboxes: BTreeMap::new(),
        }
    }

    /// Creates a sandbox under `key`. Fails if the key is taken.
    pub fn create(&mut self, key: &str, options: SandboxOptions) -> Result<SandboxRef, SandboxError> {
        if self.sandboxes.contains_key(key) {
            return Err(SandboxError::Registry(format!(
                "a sandbox is already registered for '{}'",
                key
            )));
        }
        let sandbox = Rc::new(RefCell::new(Sandbox::new(&self.host, options)));
        debug!("registered sandbox {} for '{}'", sandbox.borrow().id(), key);
        self.sandboxes.insert(key.to_string(), sandbox.clone());
        Ok(sandbox)
    }

    pub fn get(&self, key: &str) -> Option<SandboxRef> {
        self.sandboxes.get(key).cloned()
    }

    /// The sandbox under `key`, created with `options` if there is none.
    pub fn get_or_create(&mut self, key: &str, options: SandboxOptions) -> Result<SandboxRef, SandboxError> {
        match self.get(key) {
            Some(sandbox) => Ok(sandbox),
            None => self.create(key, options),
        }
    }

    /// Tears the sandbox down and forgets it. The entry is removed even when
    /// teardown fails; the failure is returned.
    pub fn evict(&mut self, key: &str) -> Result<Option<SandboxRef>, SandboxError> {
        let sandbox = match self.sandboxes.remove(key) {
            Some(sandbox) => sandbox,
            None => return Ok(None),
        };
        debug!("evicting sandbox for '{}'", key);
        sandbox.borrow_mut().teardown()?;
        Ok(Some(sandbox))
    }

    pub fn keys(&self) -> Vec<String> {
        self.sandboxes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sandboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sandboxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxState;

    #[test]
    fn test_create_rejects_duplicate_keys() {
        let host = HostEnvironment::new();
        let mut registry = SandboxRegistry::new(&host);
        registry.create("app", SandboxOptions::default()).unwrap();
        assert!(matches!(
            registry.create("app", SandboxOptions::default()),
            Err(SandboxError::Registry(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_reuses_entry() {
        let host = HostEnvironment::new();
        let mut registry = SandboxRegistry::new(&host);
        let a = registry.get_or_create("app", SandboxOptions::default()).unwrap();
        let b = registry.get_or_create("app", SandboxOptions::multi()).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!b.borrow().options().multi_mode);
    }

    #[test]
    fn test_evict_tears_down() {
        let host = HostEnvironment::new();
        let mut registry = SandboxRegistry::new(&host);
        let sandbox = registry.create("app", SandboxOptions::default()).unwrap();
        sandbox.borrow_mut().execute("leftover = true", None).unwrap();
        assert!(host.has("leftover"));
        let evicted = registry.evict("app").unwrap().unwrap();
        assert_eq!(evicted.borrow().state(), SandboxState::Inert);
        assert!(!host.has("leftover"));
        assert!(registry.get("app").is_none());
        assert!(registry.evict("app").unwrap().is_none());
    }

    #[test]
    fn test_keys_are_sorted() {
        let host = HostEnvironment::new();
        let mut registry = SandboxRegistry::new(&host);
        registry.create("b", SandboxOptions::default()).unwrap();
        registry.create("a", SandboxOptions::default()).unwrap();
        assert_eq!(registry.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
