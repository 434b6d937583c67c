use super::event::Event;
use super::id::RecordId;
use crate::error::SettlementError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl FromStr for Role {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(SettlementError::ValidationError(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

/// Decoded session claims, passed explicitly into every roster operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: RecordId,
    pub role: Role,
}

impl Claims {
    pub fn new(user_id: RecordId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Admins manage every event, teachers only the events they own.
    pub fn ensure_manages(&self, event: &Event) -> Result<(), SettlementError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Teacher if event.teacher_id.as_ref() == Some(&self.user_id) => Ok(()),
            Role::Teacher => Err(SettlementError::Unauthorized(
                "Event not found or access denied".to_string(),
            )),
            Role::Student => Err(SettlementError::Unauthorized(
                "Students cannot manage registrations".to_string(),
            )),
        }
    }

    /// Admins see any student's registrations, students only their own.
    pub fn ensure_views_student(&self, student_id: &RecordId) -> Result<(), SettlementError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student if &self.user_id == student_id => Ok(()),
            _ => Err(SettlementError::Unauthorized(
                "Registrations of another student".to_string(),
            )),
        }
    }
}
