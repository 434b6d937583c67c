use crate::domain::claims::Claims;
use crate::domain::event::Event;
use crate::domain::id::RecordId;
use crate::domain::ports::Stores;
use crate::domain::registration::{
    EventSummary, PaymentStatus, Registration, StudentRegistration,
};
use crate::domain::stats::RegistrationStats;
use crate::error::{Result, SettlementError};
use crate::interfaces::csv::registration_writer::RegistrationWriter;
use std::io::Write;
use tracing::info;

/// Field changes an organiser can make to an existing registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationUpdate {
    pub attendance: Option<bool>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

/// Organiser-side reads and edits of an event's registrations.
///
/// Every operation takes the caller's claims; admins see every event,
/// teachers only their own.
pub struct RosterService {
    stores: Stores,
}

impl RosterService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Registrations of the event, newest first.
    pub async fn event_registrations(
        &self,
        claims: &Claims,
        event_id: &RecordId,
    ) -> Result<Vec<Registration>> {
        self.managed_event(claims, event_id).await?;
        let mut registrations = self.stores.registrations.list_for_event(event_id).await?;
        registrations.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(registrations)
    }

    pub async fn update_registration(
        &self,
        claims: &Claims,
        registration_id: &RecordId,
        update: RegistrationUpdate,
    ) -> Result<Registration> {
        let mut registration = self
            .stores
            .registrations
            .get(registration_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound("Registration".to_string()))?;
        self.managed_event(claims, &registration.event_id).await?;

        if let Some(status) = update.payment_status {
            // reinstating would bypass the capacity and uniqueness checks
            if !registration.is_active() && status != PaymentStatus::Cancelled {
                return Err(SettlementError::ValidationError(
                    "Cancelled registrations cannot be reinstated".to_string(),
                ));
            }
            registration.payment_status = status;
        }
        if let Some(attendance) = update.attendance {
            registration.attendance = attendance;
        }
        if let Some(notes) = update.notes {
            let notes = notes.trim().to_string();
            registration.notes = (!notes.is_empty()).then_some(notes);
        }

        self.stores.registrations.store(registration.clone()).await?;
        Ok(registration)
    }

    /// Marks the listed registrations of the event as attended. Ids that do
    /// not belong to the event are skipped. Returns how many were marked.
    pub async fn mark_attendance(
        &self,
        claims: &Claims,
        event_id: &RecordId,
        registration_ids: &[RecordId],
    ) -> Result<usize> {
        self.managed_event(claims, event_id).await?;

        let mut marked = 0;
        for registration_id in registration_ids {
            let Some(mut registration) = self.stores.registrations.get(registration_id).await?
            else {
                continue;
            };
            if &registration.event_id != event_id {
                continue;
            }
            registration.attendance = true;
            self.stores.registrations.store(registration).await?;
            marked += 1;
        }

        info!(event_id = %event_id, marked, "attendance marked");
        Ok(marked)
    }

    pub async fn registration_stats(
        &self,
        claims: &Claims,
        event_id: &RecordId,
    ) -> Result<RegistrationStats> {
        let event = self.managed_event(claims, event_id).await?;
        let registrations = self.stores.registrations.list_for_event(event_id).await?;
        Ok(RegistrationStats::compute(&event, &registrations))
    }

    /// Writes the event's registrations as CSV, oldest first. Returns the
    /// number of rows written.
    pub async fn export_registrations<W: Write>(
        &self,
        claims: &Claims,
        event_id: &RecordId,
        sink: W,
    ) -> Result<usize> {
        let mut registrations = self.event_registrations(claims, event_id).await?;
        registrations.reverse();
        let mut writer = RegistrationWriter::new(sink);
        writer.write_registrations(&registrations)?;
        Ok(registrations.len())
    }

    /// A student's own registrations with their event details, newest first.
    pub async fn student_registrations(
        &self,
        claims: &Claims,
        student_id: &RecordId,
    ) -> Result<Vec<StudentRegistration>> {
        claims.ensure_views_student(student_id)?;
        let mut registrations = self.stores.registrations.list_for_student(student_id).await?;
        registrations.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));

        let mut listed = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let event = self.stores.events.get(&registration.event_id).await?;
            listed.push(StudentRegistration {
                event: event.as_ref().map(EventSummary::from),
                registration,
            });
        }
        Ok(listed)
    }

    async fn managed_event(&self, claims: &Claims, event_id: &RecordId) -> Result<Event> {
        let event = self
            .stores
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound("Event".to_string()))?;
        claims.ensure_manages(&event)?;
        Ok(event)
    }
}
