//! Mock Payment Provider
//!
//! For testing and local demos. Keeps sessions in memory and lets callers
//! mark them paid.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{
    CheckoutRequest, CheckoutSession, PaymentProvider, PaymentStatus, SessionSnapshot,
};
use crate::error::{PaymentError, Result};

/// In-memory payment provider
#[derive(Default)]
pub struct MockPaymentProvider {
    sessions: RwLock<HashMap<String, SessionSnapshot>>,
    create_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_session` calls received
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `retrieve_session` calls received
    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    /// Make every call fail as if the provider were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a session directly
    pub async fn insert_session(&self, session: SessionSnapshot) {
        self.sessions.write().await.insert(session.id.clone(), session);
    }

    /// Complete payment for a session. Returns false for unknown sessions.
    pub async fn mark_paid(&self, session_id: &str, email: Option<&str>) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return false;
        };

        session.payment_status = PaymentStatus::Paid;
        if let Some(email) = email {
            session.customer_email = Some(email.to_string());
        }
        true
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PaymentError::Stripe("Mock provider unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
        let amount_total = request
            .line_items
            .iter()
            .map(|item| item.unit_amount * i64::try_from(item.quantity).unwrap_or(1))
            .sum();

        let snapshot = SessionSnapshot {
            id: id.clone(),
            payment_status: PaymentStatus::Unpaid,
            customer_email: request.customer_email.clone(),
            amount_total,
            descriptions: request.line_items.iter().map(|item| item.name.clone()).collect(),
            catalog_ids: request.line_items.iter().map(|item| item.catalog_id.clone()).collect(),
        };
        self.sessions.write().await.insert(id.clone(), snapshot);

        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.mock/pay/{id}"),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::Stripe(format!("No such checkout session: '{session_id}'")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
