//! Bookkeeping of listener and timer registrations made from inside a sandbox.
//!
//! The sandbox container gets its own `addEventListener`, `removeEventListener`,
//! `setTimeout` and `setInterval`. Each one records what hosted code registered
//! and forwards the call to the host's original native with the host global as
//! receiver. Teardown replays the ledger against the host.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use log::{debug, trace};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, PropertyDescriptor};
use crate::runner::ds::operations::type_conversion::{to_integer, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::host::types::{BuiltInFn, EvalContext};
use crate::runner::host::HostEnvironment;

/// Registrations made through one sandbox, kept after teardown for inspection.
#[derive(Debug, Clone, Default)]
pub struct RegistrationLedger {
    listeners: BTreeMap<String, Vec<JsValue>>,
    timeouts: BTreeSet<i64>,
    intervals: BTreeSet<i64>,
}

impl RegistrationLedger {
    pub fn new() -> Self {
        RegistrationLedger::default()
    }

    pub fn record_listener(&mut self, event: &str, listener: JsValue) {
        self.listeners
            .entry(event.to_string())
            .or_insert_with(Vec::new)
            .push(listener);
    }

    /// Drops the first matching entry. Returns whether one was found.
    pub fn forget_listener(&mut self, event: &str, listener: &JsValue) -> bool {
        match self.listeners.get_mut(event) {
            Some(entries) => match entries.iter().position(|l| l == listener) {
                Some(i) => {
                    entries.remove(i);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    pub fn record_timeout(&mut self, id: i64) {
        self.timeouts.insert(id);
    }

    pub fn record_interval(&mut self, id: i64) {
        self.intervals.insert(id);
    }

    pub fn listeners(&self) -> &BTreeMap<String, Vec<JsValue>> {
        &self.listeners
    }

    pub fn listeners_for(&self, event: &str) -> &[JsValue] {
        self.listeners.get(event).map(|l| l.as_slice()).unwrap_or(&[])
    }

    pub fn timeouts(&self) -> &BTreeSet<i64> {
        &self.timeouts
    }

    pub fn intervals(&self) -> &BTreeSet<i64> {
        &self.intervals
    }

    /// Removes every recorded listener from the host and cancels every recorded
    /// timer. Cancelling an already fired timer is harmless.
    pub fn replay_teardown(&self, host: &HostEnvironment) {
        for (event, listeners) in self.listeners.iter() {
            for listener in listeners {
                host.remove_event_listener(event, listener);
            }
            debug!("removed {} '{}' listener(s)", listeners.len(), event);
        }
        for id in self.timeouts.iter().chain(self.intervals.iter()) {
            host.clear_timer(*id);
        }
        debug!(
            "cancelled {} timeout(s) and {} interval(s)",
            self.timeouts.len(),
            self.intervals.len()
        );
    }
}

pub type SharedLedger = Rc<RefCell<RegistrationLedger>>;

#[derive(Clone, Copy)]
enum Hijack {
    AddListener,
    RemoveListener,
    Timeout,
    Interval,
}

impl Hijack {
    fn name(self) -> &'static str {
        match self {
            Hijack::AddListener => "addEventListener",
            Hijack::RemoveListener => "removeEventListener",
            Hijack::Timeout => "setTimeout",
            Hijack::Interval => "setInterval",
        }
    }
}

fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

/// Installs the four recording natives on `container`. A registration native
/// the host does not provide is skipped.
pub fn install_hijacks(container: &JsObjectType, host: &Rc<HostEnvironment>, ledger: &SharedLedger) {
    for hijack in [
        Hijack::AddListener,
        Hijack::RemoveListener,
        Hijack::Timeout,
        Hijack::Interval,
    ]
    .iter()
    {
        let original = match host.get(hijack.name()) {
            Some(f @ JsValue::Object(_)) => f,
            _ => continue,
        };
        let ledger = ledger.clone();
        let hijack = *hijack;
        let func = BuiltInFn::Closure(Rc::new(
            move |ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| -> Result<JsValue, JErrorType> {
                forward(ctx, hijack, &original, &ledger, args)
            },
        ));
        let f = host.intrinsics().new_native_function(hijack.name(), func, false);
        container
            .borrow_mut()
            .define_own_property(hijack.name(), PropertyDescriptor::hidden(f));
    }
}

fn forward(
    ctx: &mut EvalContext,
    hijack: Hijack,
    original: &JsValue,
    ledger: &SharedLedger,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let receiver = ctx.host.global();
    match hijack {
        Hijack::AddListener => {
            let event = to_string(&arg(&args, 0));
            let listener = arg(&args, 1);
            if !listener.is_nullish() {
                trace!("tracking '{}' listener", event);
                ledger.borrow_mut().record_listener(&event, listener);
            }
            call_function(ctx, original, receiver, args)
        }
        Hijack::RemoveListener => {
            let event = to_string(&arg(&args, 0));
            ledger.borrow_mut().forget_listener(&event, &arg(&args, 1));
            call_function(ctx, original, receiver, args)
        }
        Hijack::Timeout | Hijack::Interval => {
            let id = call_function(ctx, original, receiver, args)?;
            if let JsValue::Number(_) = id {
                let mut ledger = ledger.borrow_mut();
                match hijack {
                    Hijack::Interval => ledger.record_interval(to_integer(&id)),
                    _ => ledger.record_timeout(to_integer(&id)),
                }
                trace!("tracking {} {}", hijack.name(), id);
            }
            Ok(id)
        }
    }
}
