use super::notice;
use crate::config::GatewayConfig;
use crate::domain::event::Event;
use crate::domain::id::RecordId;
use crate::domain::order::{OrderRequest, OrderResult, OrderTicket};
use crate::domain::ports::{
    ClockBox, GatewayError, InsertOutcome, NotifierBox, PaymentGatewayBox, Stores, SystemClock,
};
use crate::domain::registration::{Charge, Registration};
use crate::domain::signature::verify_payment_signature;
use crate::domain::student::Student;
use crate::error::{Result, SettlementError};
use tracing::{info, warn};

/// Currency and signing secret the settlement flow needs from configuration.
#[derive(Debug, Clone)]
pub struct SettlementSettings {
    pub currency: String,
    pub key_secret: String,
}

impl From<&GatewayConfig> for SettlementSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

/// Runs order initiation, payment verification and registration
/// finalization.
///
/// Each call is independent; the service keeps no per-call state. The
/// duplicate and capacity guarantees come from the store's atomic
/// conditional insert, the earlier read-only checks only fail fast.
pub struct SettlementService {
    stores: Stores,
    gateway: PaymentGatewayBox,
    notifier: NotifierBox,
    clock: ClockBox,
    settings: SettlementSettings,
}

impl SettlementService {
    pub fn new(
        stores: Stores,
        gateway: PaymentGatewayBox,
        notifier: NotifierBox,
        settings: SettlementSettings,
    ) -> Self {
        Self {
            stores,
            gateway,
            notifier,
            clock: Box::new(SystemClock),
            settings,
        }
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the request and either registers a free event directly or
    /// opens a provider order for a paid one.
    pub async fn initiate_order(
        &self,
        event_id: &RecordId,
        student_id: &RecordId,
    ) -> Result<OrderResult> {
        let event = self.event(event_id).await?;
        self.student(student_id).await?;

        if self
            .stores
            .registrations
            .find_active(event_id, student_id)
            .await?
            .is_some()
        {
            return Err(SettlementError::AlreadyRegistered);
        }

        if event.capacity.is_some() {
            let active = self.stores.registrations.count_active(event_id).await?;
            if event.is_full(active) {
                return Err(SettlementError::EventFull);
            }
        }

        if event.deadline_passed(self.clock.now()) {
            return Err(SettlementError::DeadlinePassed);
        }

        let amount = event.fee().minor_units()?;
        if amount == 0 {
            let registration = self.finalize(event_id, student_id, None).await?;
            return Ok(OrderResult::Registered { registration });
        }

        let request = OrderRequest::new(&event, student_id, amount, &self.settings.currency);
        let order = self
            .gateway
            .create_order(&request)
            .await
            .map_err(|e| SettlementError::PaymentProviderError(e.to_string()))?;

        info!(
            order_id = %order.id,
            event_id = %event_id,
            student_id = %student_id,
            amount = order.amount,
            "payment order created"
        );

        Ok(OrderResult::PaymentRequired {
            order: OrderTicket {
                order_id: order.id,
                amount: order.amount,
                currency: order.currency,
                key_id: self.gateway.key_id().to_string(),
            },
        })
    }

    /// Checks the callback signature locally, confirms the payment with the
    /// provider, then finalizes the registration.
    ///
    /// The provider's view decides what is settled: the payment must belong
    /// to `order_id`, the order must have been opened for this (event,
    /// student) pair, and the amount recorded is the amount captured.
    pub async fn verify_and_finalize(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        event_id: &RecordId,
        student_id: &RecordId,
    ) -> Result<Registration> {
        if !verify_payment_signature(&self.settings.key_secret, order_id, payment_id, signature) {
            warn!(order_id, payment_id, "payment signature mismatch");
            return Err(SettlementError::InvalidSignature);
        }

        let payment = self
            .gateway
            .fetch_payment(payment_id)
            .await
            .map_err(verification_error)?;

        if let Some(paid_order) = payment.order_id.as_deref() {
            if paid_order != order_id {
                return Err(SettlementError::PaymentVerificationFailed(format!(
                    "payment {} belongs to order {}",
                    payment_id, paid_order
                )));
            }
        }

        if !payment.is_completed() {
            return Err(SettlementError::PaymentNotCompleted(payment.status));
        }

        let order = self
            .gateway
            .fetch_order(order_id)
            .await
            .map_err(verification_error)?;

        let for_pair = order
            .notes
            .as_ref()
            .is_some_and(|notes| notes.names_pair(event_id, student_id));
        if !for_pair {
            warn!(
                order_id,
                event_id = %event_id,
                student_id = %student_id,
                "order does not name this registration"
            );
            return Err(SettlementError::PaymentVerificationFailed(format!(
                "order {} was not opened for this registration",
                order_id
            )));
        }

        if payment.amount != order.amount || payment.currency != order.currency {
            return Err(SettlementError::PaymentVerificationFailed(format!(
                "payment {} does not cover order {}",
                payment_id, order_id
            )));
        }

        let settled = self
            .stores
            .registrations
            .list_for_payment(payment_id)
            .await?;
        if settled
            .iter()
            .any(|r| !(r.is_active() && r.belongs_to(event_id, student_id)))
        {
            return Err(SettlementError::PaymentVerificationFailed(format!(
                "payment {} already settles another registration",
                payment_id
            )));
        }

        let event = self.event(event_id).await?;
        let student = self.student(student_id).await?;
        let charge = Charge::from_minor_units(payment_id, payment.amount);
        self.settle(event, student, Some(charge)).await
    }

    /// Persists the registration for the pair, links it to the event and
    /// the student, and sends the confirmation.
    ///
    /// A `payment_id` is recorded at the event's current fee. Running it
    /// again for a pair that already holds a non-cancelled registration
    /// returns that registration without creating another.
    pub async fn finalize(
        &self,
        event_id: &RecordId,
        student_id: &RecordId,
        payment_id: Option<String>,
    ) -> Result<Registration> {
        let event = self.event(event_id).await?;
        let student = self.student(student_id).await?;
        let charge = payment_id.map(|id| Charge::at_fee(&event, id));
        self.settle(event, student, charge).await
    }

    async fn settle(
        &self,
        event: Event,
        student: Student,
        charge: Option<Charge>,
    ) -> Result<Registration> {
        let payment_id = charge.as_ref().map(|c| c.payment_id.clone());
        let candidate = Registration::for_student(&event, &student, charge, self.clock.now());
        let outcome = self
            .stores
            .registrations
            .insert_if_vacant(candidate, event.capacity)
            .await?;

        let registration = match outcome {
            InsertOutcome::Inserted(registration) => registration,
            InsertOutcome::Duplicate(existing) => {
                if payment_id.is_some() && existing.payment_id != payment_id {
                    warn!(
                        registration_id = %existing.id,
                        payment_id = payment_id.as_deref().unwrap_or_default(),
                        "payment received for an existing registration"
                    );
                } else {
                    info!(registration_id = %existing.id, "registration already finalized");
                }
                // heal links a previous run may not have written
                self.link(&event, &student, &existing).await?;
                return Ok(existing);
            }
            InsertOutcome::Full => return Err(SettlementError::EventFull),
        };

        info!(
            registration_id = %registration.id,
            event_id = %event.id,
            student_id = %student.id,
            status = %registration.payment_status,
            "registration created"
        );

        self.link(&event, &student, &registration).await?;

        let message = notice::confirmation(&event, &student, &registration, &self.settings.currency);
        if let Err(e) = self.notifier.send(message).await {
            warn!(registration_id = %registration.id, error = %e, "confirmation not delivered");
        }

        Ok(registration)
    }

    async fn link(&self, event: &Event, student: &Student, registration: &Registration) -> Result<()> {
        self.stores
            .events
            .link_registration(&event.id, &registration.id)
            .await?;
        self.stores
            .students
            .add_event_name(&student.id, &event.name)
            .await?;
        Ok(())
    }

    async fn event(&self, event_id: &RecordId) -> Result<Event> {
        self.stores
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound("Event".to_string()))
    }

    async fn student(&self, student_id: &RecordId) -> Result<Student> {
        self.stores
            .students
            .get(student_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound("Student".to_string()))
    }
}

/// A timeout is the provider's fault; anything else fails verification.
fn verification_error(error: GatewayError) -> SettlementError {
    match error {
        GatewayError::Timeout => SettlementError::PaymentProviderError(error.to_string()),
        other => SettlementError::PaymentVerificationFailed(other.to_string()),
    }
}
