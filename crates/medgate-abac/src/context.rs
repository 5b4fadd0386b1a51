//! Per-request attribute store.
//!
//! An [`AttributeContext`] is built fresh for every authorization decision
//! from the authenticated principal and the target resource, handed to the
//! evaluator once, and dropped. It owns every string it stores.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ContextError;
use crate::value::AttributeValue;

/// Default upper bound on the number of attributes in one context.
pub const DEFAULT_MAX_ATTRIBUTES: usize = 64;

/// A bounded map from attribute name to typed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeContext {
    attributes: HashMap<String, AttributeValue>,
    #[serde(skip)]
    capacity: usize,
}

impl Default for AttributeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeContext {
    /// Creates an empty context holding at most [`DEFAULT_MAX_ATTRIBUTES`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ATTRIBUTES)
    }

    /// Creates an empty context holding at most `capacity` attributes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            attributes: HashMap::with_capacity(capacity.min(DEFAULT_MAX_ATTRIBUTES)),
            capacity,
        }
    }

    /// Stores `value` under `name`, replacing any previous value and type.
    ///
    /// Replacing an existing name never counts against the capacity.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ContextError> {
        if name.is_empty() {
            return Err(ContextError::InvalidName);
        }

        let value = value.into();
        if let Some(slot) = self.attributes.get_mut(name) {
            *slot = value;
            return Ok(());
        }

        if self.attributes.len() >= self.capacity {
            return Err(ContextError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(
        mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, ContextError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Looks up an attribute. `None` means the attribute is absent.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over attributes in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a context from a flat JSON object such as
    /// `{"role": "Doctor", "clearance": 3, "on_call": true}`.
    pub fn from_json(json: &serde_json::Value, capacity: usize) -> Result<Self, ContextError> {
        let object = json
            .as_object()
            .ok_or_else(|| ContextError::InvalidJson(format!("got {json}")))?;

        let mut ctx = Self::with_capacity(capacity);
        for (name, raw) in object {
            let value =
                AttributeValue::from_json(raw).ok_or_else(|| ContextError::UnsupportedValue {
                    name: name.clone(),
                    value: raw.to_string(),
                })?;
            ctx.set(name, value)?;
        }
        Ok(ctx)
    }

    /// Parses JSON text and delegates to [`from_json`](Self::from_json).
    pub fn from_json_str(text: &str, capacity: usize) -> Result<Self, ContextError> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ContextError::InvalidJson(e.to_string()))?;
        Self::from_json(&json, capacity)
    }
}

// ============================================================================
// Tests
// ============================================================================
