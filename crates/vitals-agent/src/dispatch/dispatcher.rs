use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::{ActionDescriptor, ActionKind};

/// Remote-triggerable operation.
///
/// The returned string is the only result channel back to the caller; by
/// convention it is empty on failure (failures go to the notifier instead).
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ActionKind;
    async fn invoke(&self, payload: Value) -> String;
}

/// Host-registered action wrapping a plain closure.
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(Value) -> String + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(Value) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Custom
    }

    async fn invoke(&self, payload: Value) -> String {
        (self.f)(payload)
    }
}

/// Registry and dispatcher for named actions.
#[derive(Default)]
pub struct Dispatcher {
    actions: DashMap<String, Arc<dyn ActionHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            actions: DashMap::new(),
        }
    }

    /// Register an action. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&self, action: Arc<dyn ActionHandler>) {
        let name = action.name().to_string();
        if self.actions.insert(name.clone(), action).is_some() {
            tracing::warn!(action = %name, "action replaced");
        }
    }

    pub fn registered(&self) -> Vec<String> {
        self.actions.iter().map(|e| e.key().clone()).collect()
    }

    /// Action list advertised in the status snapshot, sorted by name.
    pub fn descriptors(&self) -> Vec<ActionDescriptor> {
        let mut out: Vec<ActionDescriptor> = self
            .actions
            .iter()
            .map(|e| ActionDescriptor {
                name: e.key().clone(),
                kind: e.value().kind(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub async fn invoke(&self, name: &str, payload: Value) -> Result<String> {
        let handler = self
            .actions
            .get(name)
            .ok_or_else(|| VitalsError::UnknownAction(name.to_string()))?
            .value()
            .clone();
        tracing::info!(action = %name, "invoking action");
        Ok(handler.invoke(payload).await)
    }
}
