//! Filter chains wrapped around method calls.
//!
//! A filter receives the receiver, the call parameters and the rest of the
//! chain. Calling [`Chain::next`] continues to the next filter and finally
//! to the terminal step (the real call). Returning without calling `next`
//! short-circuits the call.
//!
//! ```rust,ignore
//! registry.apply_filter(&mock, "paint", filter(|this, params, chain| {
//!     let result = chain.next(this, params)?;
//!     Ok(Value::from(format!("<{result}>")))
//! }));
//! ```

use crate::object::{ClassDef, ObjectRef};
use crate::result::MockResult;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The `self` handed to filters
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Instance method call
    Instance(ObjectRef),
    /// Static method call, with the called class
    Class(Arc<ClassDef>),
}

impl Receiver {
    /// Name of the receiver's class
    #[must_use]
    pub fn class_name(&self) -> &str {
        match self {
            Self::Instance(obj) => obj.class_name(),
            Self::Class(class) => class.name(),
        }
    }

    /// Instance handle, for instance calls
    #[must_use]
    pub const fn object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Instance(obj) => Some(obj),
            Self::Class(_) => None,
        }
    }
}

/// A filter function
pub type Filter = Arc<dyn Fn(&Receiver, Vec<Value>, &Chain<'_>) -> MockResult<Value> + Send + Sync>;

/// Terminal step of a chain: the unwrapped call
pub type Terminal<'a> = dyn Fn(&Receiver, Vec<Value>) -> MockResult<Value> + 'a;

/// Wrap a closure as a [`Filter`]
pub fn filter<F>(f: F) -> Filter
where
    F: Fn(&Receiver, Vec<Value>, &Chain<'_>) -> MockResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The remaining filters of a call, plus its terminal step
pub struct Chain<'a> {
    method: &'a str,
    filters: &'a [Filter],
    terminal: &'a Terminal<'a>,
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("method", &self.method)
            .field("remaining", &self.filters.len())
            .finish()
    }
}

impl<'a> Chain<'a> {
    /// Method the chain wraps
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method
    }

    /// Number of filters not yet run
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.filters.len()
    }

    /// Continue with the next filter, or the terminal when none are left
    pub fn next(&self, receiver: &Receiver, params: Vec<Value>) -> MockResult<Value> {
        match self.filters.split_first() {
            Some((head, rest)) => {
                let chain = Chain {
                    method: self.method,
                    filters: rest,
                    terminal: self.terminal,
                };
                head(receiver, params, &chain)
            }
            None => (self.terminal)(receiver, params),
        }
    }
}

/// Run `filters` in order, outermost first, around `terminal`
pub fn run_chain(
    method: &str,
    receiver: &Receiver,
    filters: &[Filter],
    params: Vec<Value>,
    terminal: &Terminal<'_>,
) -> MockResult<Value> {
    tracing::trace!(
        class = receiver.class_name(),
        method,
        filters = filters.len(),
        "running filter chain"
    );
    let chain = Chain {
        method,
        filters,
        terminal,
    };
    chain.next(receiver, params)
}

/// Filters keyed by method name
#[derive(Clone, Default)]
pub struct FilterTable {
    by_method: HashMap<String, Vec<Filter>>,
}

impl fmt::Debug for FilterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .by_method
            .iter()
            .map(|(method, filters)| (method.as_str(), filters.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("FilterTable").field("filters", &counts).finish()
    }
}

impl FilterTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter for a method
    pub fn add(&mut self, method: impl Into<String>, filter: Filter) {
        self.by_method.entry(method.into()).or_default().push(filter);
    }

    /// Filters for a method, in registration order
    #[must_use]
    pub fn get(&self, method: &str) -> Vec<Filter> {
        self.by_method.get(method).cloned().unwrap_or_default()
    }

    /// Drop the filters of one method
    pub fn clear(&mut self, method: &str) {
        self.by_method.remove(method);
    }

    /// Methods with at least one filter
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<_> = self.by_method.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// Total number of filters
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_method.values().map(Vec::len).sum()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ClassBuilder;
    use std::sync::Mutex;

    fn receiver() -> Receiver {
        Receiver::Class(Arc::new(ClassBuilder::new("app.Subject").finish(None)))
    }

    #[test]
    fn test_no_filters_runs_terminal() {
        let terminal =
            |_: &Receiver, params: Vec<Value>| -> MockResult<Value> { Ok(Value::Int(params.len() as i64)) };
        let result = run_chain("count", &receiver(), &[], vec![Value::Null; 3], &terminal).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn test_filters_run_outermost_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let make = |label: &'static str| {
            let order = Arc::clone(&order);
            filter(move |this, params, chain| {
                order.lock().unwrap().push(label);
                chain.next(this, params)
            })
        };
        let filters = vec![make("outer"), make("inner")];
        let seen = Arc::clone(&order);
        let terminal = move |_: &Receiver, _: Vec<Value>| -> MockResult<Value> {
            seen.lock().unwrap().push("terminal");
            Ok(Value::Null)
        };
        run_chain("run", &receiver(), &filters, vec![], &terminal).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner", "terminal"]);
    }

    #[test]
    fn test_short_circuit_skips_terminal() {
        let filters = vec![filter(|_, _, _| Ok(Value::from("stubbed")))];
        let terminal = |_: &Receiver, _: Vec<Value>| -> MockResult<Value> {
            panic!("terminal must not run")
        };
        let result = run_chain("paint", &receiver(), &filters, vec![], &terminal).unwrap();
        assert_eq!(result, Value::from("stubbed"));
    }

    #[test]
    fn test_filter_can_rewrite_params() {
        let filters = vec![filter(|this, mut params, chain| {
            params[0] = Value::from("blue");
            chain.next(this, params)
        })];
        let terminal =
            |_: &Receiver, params: Vec<Value>| -> MockResult<Value> { Ok(params[0].clone()) };
        let result =
            run_chain("paint", &receiver(), &filters, vec![Value::from("red")], &terminal).unwrap();
        assert_eq!(result, Value::from("blue"));
    }

    #[test]
    fn test_filter_table() {
        let mut table = FilterTable::new();
        assert!(table.is_empty());
        table.add("paint", filter(|_, _, _| Ok(Value::Null)));
        table.add("paint", filter(|_, _, _| Ok(Value::Null)));
        table.add("create", filter(|_, _, _| Ok(Value::Null)));
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("paint").len(), 2);
        assert_eq!(table.methods(), vec!["create", "paint"]);
        table.clear("paint");
        assert!(table.get("paint").is_empty());
        assert_eq!(table.len(), 1);
    }
}
