//! Decides how a callable read from the host global reaches hosted code.
//!
//! Constructor-like callables are handed out unmodified. Plain callables get a
//! bound copy whose receiver is the host global, because receiver-checked host
//! natives reject the sandbox reference. The evaluation primitive is never
//! touched. Classification consults the caller's table, then the built-in
//! defaults, then a best-effort heuristic over the callable's shape and source
//! text. The heuristic can misjudge minified or generated code.

use std::collections::HashSet;
use std::rc::Rc;

use log::trace;

use crate::runner::ds::function_object::{BoundFunction, FunctionKind, FunctionObject};
use crate::runner::ds::object::{new_object, JsObjectType, ObjectKind};
use crate::runner::ds::value::JsValue;
use crate::runner::host::HostEnvironment;
use crate::sandbox::config::{CallableClassification, Classification};

/// Shape and naming heuristic for callables nobody classified explicitly.
pub fn is_constructor_like(f: &JsObjectType) -> bool {
    let obj = f.borrow();
    let function = match obj.as_function() {
        Some(function) => function,
        None => return false,
    };
    let prototype = obj.get_own_property("prototype").map(|d| d.value.clone());
    if let Some(JsValue::Object(p)) = prototype {
        let p = p.borrow();
        let points_back = match p.get_own_property("constructor").map(|d| &d.value) {
            Some(JsValue::Object(c)) => Rc::ptr_eq(c, f),
            _ => false,
        };
        if points_back && p.own_property_keys().len() > 1 {
            return true;
        }
    }
    function.is_class() || has_capitalized_function_name(&function.source_text())
}

/// `function` followed by whitespace and an uppercase initial.
fn has_capitalized_function_name(source: &str) -> bool {
    let rest = match source.strip_prefix("function") {
        Some(rest) => rest,
        None => return false,
    };
    let name = rest.trim_start();
    name.len() < rest.len() && name.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}

/// Classification of `value` read under `name`; `None` for values that are
/// returned as they are (non-callables and the evaluation primitive).
pub fn classify(name: &str, value: &JsValue, table: &CallableClassification) -> Option<Classification> {
    let f = match value {
        JsValue::Object(o) if o.borrow().is_callable() => o,
        _ => return None,
    };
    if f.borrow().as_function().map_or(false, |f| f.is_eval()) {
        return None;
    }
    Some(table.lookup(name).unwrap_or_else(|| {
        if is_constructor_like(f) {
            Classification::Preserve
        } else {
            Classification::Rebind
        }
    }))
}

/// Returns `value` ready to be handed to hosted code.
pub fn normalize(name: &str, value: JsValue, host: &HostEnvironment, table: &CallableClassification) -> JsValue {
    match (classify(name, &value, table), &value) {
        (Some(Classification::Rebind), JsValue::Object(f)) => {
            trace!("rebinding host callable '{}'", name);
            rebind(f, host)
        }
        _ => value,
    }
}

/// Enumerable members of `f` and of its prototype chain, as `for-in` would
/// list them. Own members shadow inherited ones.
fn enumerable_members(f: &JsObjectType) -> Vec<(String, JsValue)> {
    let mut seen = HashSet::new();
    let mut members = vec![];
    let mut current = Some(f.clone());
    while let Some(o) = current {
        let obj = o.borrow();
        for k in obj.own_enumerable_keys() {
            if seen.insert(k.to_string()) {
                if let Some(d) = obj.get_own_property(&k) {
                    members.push((k, d.value.clone()));
                }
            }
        }
        current = obj.prototype.clone();
    }
    members
}

/// Bound copy of `f` with the host global as receiver, carrying over every
/// enumerable member of the original, inherited ones included.
pub fn rebind(f: &JsObjectType, host: &HostEnvironment) -> JsValue {
    let name = f
        .borrow()
        .as_function()
        .map_or(String::new(), |f| f.name.to_string());
    let members = enumerable_members(f);
    let bound = new_object(
        ObjectKind::Function(FunctionObject {
            name: format!("bound {}", name),
            kind: FunctionKind::Bound(BoundFunction {
                target: f.clone(),
                this: host.global(),
                args: vec![],
            }),
        }),
        Some(host.intrinsics().function_prototype.clone()),
    );
    {
        let mut b = bound.borrow_mut();
        for (k, v) in members {
            b.put(k, v);
        }
    }
    JsValue::Object(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_fn(host: &Rc<HostEnvironment>, name: &str) -> JsObjectType {
        match host.get(name) {
            Some(JsValue::Object(o)) => o,
            other => panic!("{} is not an object: {:?}", name, other),
        }
    }

    fn setup() -> Rc<HostEnvironment> {
        let host = HostEnvironment::new();
        host.run_script(
            "function Widget() {}
             function helper() { return 1; }
             function point() {}
             point.prototype.norm = function () { return 0; };
             class Store { get() { return 1; } }
             var arrow = () => 1;
             var tagged = function () {};
             tagged.version = 3;",
        )
        .unwrap();
        host
    }

    #[test]
    fn test_capitalized_function_is_constructor_like() {
        let host = setup();
        assert!(is_constructor_like(&host_fn(&host, "Widget")));
    }

    #[test]
    fn test_prototype_with_methods_is_constructor_like() {
        let host = setup();
        assert!(is_constructor_like(&host_fn(&host, "point")));
    }

    #[test]
    fn test_class_is_constructor_like() {
        let host = setup();
        let store = host_fn(&host, "Store");
        assert!(store.borrow().as_function().map_or(false, |f| f.is_class()));
        assert!(is_constructor_like(&store));
    }

    #[test]
    fn test_plain_functions_are_not_constructor_like() {
        let host = setup();
        assert!(!is_constructor_like(&host_fn(&host, "helper")));
        assert!(!is_constructor_like(&host_fn(&host, "arrow")));
        assert!(!is_constructor_like(&host_fn(&host, "parseInt")));
    }

    #[test]
    fn test_native_constructor_source_is_capitalized() {
        let host = setup();
        assert!(is_constructor_like(&host_fn(&host, "Array")));
    }

    #[test]
    fn test_eval_and_non_callables_are_left_alone() {
        let host = setup();
        let table = CallableClassification::new();
        assert_eq!(classify("eval", &host.get("eval").unwrap(), &table), None);
        assert_eq!(classify("NaN", &host.get("NaN").unwrap(), &table), None);
        assert_eq!(classify("Math", &host.get("Math").unwrap(), &table), None);
    }

    #[test]
    fn test_table_wins_over_heuristic() {
        let host = setup();
        let table = CallableClassification::new()
            .with("Widget", Classification::Rebind)
            .with("helper", Classification::Preserve);
        assert_eq!(classify("Widget", &host.get("Widget").unwrap(), &table), Some(Classification::Rebind));
        assert_eq!(classify("helper", &host.get("helper").unwrap(), &table), Some(Classification::Preserve));
    }

    #[test]
    fn test_rebind_copies_enumerable_members() {
        let host = setup();
        let table = CallableClassification::new();
        let original = host.get("tagged").unwrap();
        let normalized = normalize("tagged", original.clone(), &host, &table);
        assert!(normalized != original);
        match &normalized {
            JsValue::Object(o) => {
                let o = o.borrow();
                assert_eq!(o.get_own_property("version").map(|d| d.value.clone()), Some(JsValue::integer(3)));
                assert!(matches!(o.as_function().map(|f| &f.kind), Some(FunctionKind::Bound(_))));
            }
            _ => panic!("expected a function"),
        }
    }

    #[test]
    fn test_rebind_copies_inherited_members() {
        let host = setup();
        let tagged = host_fn(&host, "tagged");
        let base = host.intrinsics().new_plain_object();
        {
            let mut b = base.borrow_mut();
            b.put("origin", JsValue::string("base"));
            b.put("version", JsValue::integer(1));
            b.prototype = tagged.borrow().prototype.clone();
        }
        tagged.borrow_mut().prototype = Some(base);
        match rebind(&tagged, &host) {
            JsValue::Object(o) => {
                let o = o.borrow();
                assert_eq!(o.get_own_property("origin").map(|d| d.value.clone()), Some(JsValue::string("base")));
                assert_eq!(o.get_own_property("version").map(|d| d.value.clone()), Some(JsValue::integer(3)));
                assert!(!o.has_own_property("call"));
            }
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_preserved_callable_is_identical() {
        let host = setup();
        let table = CallableClassification::new();
        let widget = host.get("Widget").unwrap();
        assert_eq!(normalize("Widget", widget.clone(), &host, &table), widget);
    }
}
