//! Name-keyed registry of type conversion handlers.

use super::date::DateHandler;
use super::handlers::{
    BoolHandler, ByteHandler, CharHandler, DoubleHandler, FloatHandler, IntHandler, LongHandler,
    ShortHandler, TypeConversionHandler,
};
use super::value::Value;
use crate::common::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to a conversion handler.
pub type HandlerRef = Arc<dyn TypeConversionHandler>;

/// Maps type names to conversion handlers.
///
/// Each reader and writer owns one; there is no process-wide instance.
/// Lookups never fail: a missing handler means pass-through string behavior.
#[derive(Debug, Clone)]
pub struct ConversionRegistry {
    handlers: HashMap<String, HandlerRef>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConversionRegistry {
    /// A registry with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry seeded with the bool, char, integer, float and date handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        let defaults: [HandlerRef; 9] = [
            Arc::new(BoolHandler),
            Arc::new(ByteHandler),
            Arc::new(CharHandler),
            Arc::new(ShortHandler),
            Arc::new(IntHandler),
            Arc::new(LongHandler),
            Arc::new(FloatHandler),
            Arc::new(DoubleHandler),
            Arc::new(DateHandler::default()),
        ];
        for handler in defaults {
            registry.register(handler);
        }
        registry
    }

    /// Register `handler` under all of its type names, replacing previous entries.
    pub fn register(&mut self, handler: HandlerRef) {
        for name in handler.type_names() {
            self.handlers.insert((*name).to_string(), Arc::clone(&handler));
        }
    }

    /// Remove the names of `handler` that still map to this very instance.
    ///
    /// Returns how many names were removed.
    pub fn unregister(&mut self, handler: &HandlerRef) -> usize {
        let mut removed = 0;
        for name in handler.type_names() {
            if self
                .handlers
                .get(*name)
                .is_some_and(|current| Arc::ptr_eq(current, handler))
            {
                self.handlers.remove(*name);
                removed += 1;
            }
        }
        removed
    }

    pub fn get(&self, type_name: &str) -> Option<&HandlerRef> {
        self.handlers.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse `text` as `type_name`; unknown or absent types yield the text as a string.
    pub fn parse(&self, type_name: Option<&str>, text: &str) -> Result<Value> {
        match type_name.and_then(|name| self.handlers.get(name)) {
            Some(handler) => handler.parse(text),
            None => Ok(Value::String(text.to_string())),
        }
    }

    /// Format a value with the handler for its own type name.
    pub fn format(&self, value: &Value) -> String {
        self.format_as(value.type_name(), value)
    }

    /// Format a value with the handler registered under `type_name`.
    pub fn format_as(&self, type_name: &str, value: &Value) -> String {
        match self.handlers.get(type_name) {
            Some(handler) => handler.format(value),
            None => value.to_string(),
        }
    }
}
