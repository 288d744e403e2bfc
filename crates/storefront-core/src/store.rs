//! Record Storage
//!
//! Storage traits for orders and call requests, plus an in-memory store for
//! development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::order::{CallRequest, Order, OrderOutcome};

/// Order storage trait
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order unless one already exists for its session id.
    ///
    /// Implementations must make the existence check and the insert a single
    /// atomic step so concurrent verifications of one session store one order.
    async fn record_order(&self, order: &Order) -> Result<OrderOutcome>;

    /// Get order by session id
    async fn find_order(&self, session_id: &str) -> Result<Option<Order>>;
}

/// Call request storage trait (append-only)
#[async_trait]
pub trait CallRequestStore: Send + Sync {
    async fn record_call_request(&self, request: &CallRequest) -> Result<()>;
}

/// In-memory store (for development)
#[derive(Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<String, Order>>,
    call_requests: RwLock<Vec<CallRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn call_requests(&self) -> Vec<CallRequest> {
        self.call_requests.read().await.clone()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn record_order(&self, order: &Order) -> Result<OrderOutcome> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.session_id) {
            return Ok(OrderOutcome::AlreadyRecorded);
        }

        orders.insert(order.session_id.clone(), order.clone());
        Ok(OrderOutcome::Created)
    }

    async fn find_order(&self, session_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(session_id).cloned())
    }
}

#[async_trait]
impl CallRequestStore for MemoryStore {
    async fn record_call_request(&self, request: &CallRequest) -> Result<()> {
        self.call_requests.write().await.push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn order(session_id: &str) -> Order {
        Order {
            session_id: session_id.into(),
            email: Some("buyer@example.com".into()),
            amount_minor: 6900,
            items: vec!["SDR Success Playbook".into()],
            catalog_ids: vec!["ebook-sdr".into()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_order_once() {
        let store = MemoryStore::new();

        assert_eq!(store.record_order(&order("cs_1")).await.unwrap(), OrderOutcome::Created);
        assert_eq!(
            store.record_order(&order("cs_1")).await.unwrap(),
            OrderOutcome::AlreadyRecorded
        );
        assert_eq!(store.order_count().await, 1);

        let stored = store.find_order("cs_1").await.unwrap().unwrap();
        assert_eq!(stored.amount_minor, 6900);
        assert!(store.find_order("cs_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_record_creates_one_order() {
        let store = Arc::new(MemoryStore::new());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_order(&order("cs_race")).await.unwrap() })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() == OrderOutcome::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_call_requests_append() {
        let store = MemoryStore::new();
        let request = CallRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            goals: "Hire SDRs".into(),
            company: None,
            created_at: Utc::now(),
        };

        store.record_call_request(&request).await.unwrap();
        store.record_call_request(&request).await.unwrap();
        assert_eq!(store.call_requests().await.len(), 2);
    }
}
