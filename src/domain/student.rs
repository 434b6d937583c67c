use super::id::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Names of the events the student is registered for, in registration order.
    #[serde(default)]
    pub event_names: Vec<String>,
}

impl Student {
    pub fn new(id: RecordId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            phone: None,
            event_names: Vec::new(),
        }
    }

    /// Records an event name without duplicating it. Returns `true` if added.
    pub fn add_event_name(&mut self, name: &str) -> bool {
        if self.event_names.iter().any(|n| n == name) {
            return false;
        }
        self.event_names.push(name.to_string());
        true
    }
}
