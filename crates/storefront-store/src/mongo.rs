//! MongoDB Store
//!
//! Implements the order and call-request stores on MongoDB. The client is
//! created on first use and then reused for the life of the process. A
//! connection counts only once the ping and the unique `orderId` index have
//! both succeeded; otherwise the store stays unconnected and the next call
//! retries.

use async_trait::async_trait;
use bson::doc;
use mongodb::{
    Client, Collection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteError, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
};
use tokio::sync::OnceCell;

use storefront_core::{
    CallRequest, CallRequestStore, Order, OrderOutcome, OrderStore, Result, StorefrontError,
};

use crate::documents::{CallRequestDocument, OrderDocument};

const ORDERS: &str = "orders";
const CALL_REQUESTS: &str = "callRequests";
const SESSION_KEY: &str = "orderId";

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

/// Connection settings
#[derive(Clone, Debug)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
        }
    }
}

struct Collections {
    orders: Collection<OrderDocument>,
    call_requests: Collection<CallRequestDocument>,
}

/// MongoDB-backed store with lazy connect-once semantics
pub struct MongoStore {
    config: MongoConfig,
    collections: OnceCell<Collections>,
}

fn storage(err: impl std::fmt::Display) -> StorefrontError {
    StorefrontError::Storage(err.to_string())
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: DUPLICATE_KEY, .. }))
    )
}

impl MongoStore {
    /// Create the store without connecting
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            collections: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.collections.initialized()
    }

    async fn collections(&self) -> Result<&Collections> {
        self.collections.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Collections> {
        let mut options = ClientOptions::parse(&self.config.uri).await.map_err(storage)?;
        options.app_name = Some("storefront".into());
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options).map_err(storage)?;
        let db = client.database(&self.config.database);
        db.run_command(doc! { "ping": 1 }).await.map_err(storage)?;

        let orders = db.collection::<OrderDocument>(ORDERS);
        let unique_session = IndexModel::builder()
            .keys(doc! { SESSION_KEY: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        // Orders are only written once the unique index exists.
        orders.create_index(unique_session).await.map_err(|e| {
            tracing::error!(
                error = %e,
                collection = ORDERS,
                "Could not create unique orderId index; remove duplicate orders"
            );
            storage(e)
        })?;

        tracing::info!(database = %self.config.database, "MongoDB connected");

        Ok(Collections {
            orders,
            call_requests: db.collection::<CallRequestDocument>(CALL_REQUESTS),
        })
    }
}

#[async_trait]
impl OrderStore for MongoStore {
    async fn record_order(&self, order: &Order) -> Result<OrderOutcome> {
        let collections = self.collections().await?;

        let mut fields = bson::to_document(&OrderDocument::from(order)).map_err(storage)?;
        fields.remove(SESSION_KEY);

        let result = collections
            .orders
            .update_one(
                doc! { SESSION_KEY: order.session_id.as_str() },
                doc! { "$setOnInsert": fields },
            )
            .upsert(true)
            .await;

        match result {
            Ok(update) if update.upserted_id.is_some() => Ok(OrderOutcome::Created),
            Ok(_) => Ok(OrderOutcome::AlreadyRecorded),
            Err(e) if is_duplicate_key(&e) => Ok(OrderOutcome::AlreadyRecorded),
            Err(e) => Err(storage(e)),
        }
    }

    async fn find_order(&self, session_id: &str) -> Result<Option<Order>> {
        let collections = self.collections().await?;

        let document = collections
            .orders
            .find_one(doc! { SESSION_KEY: session_id })
            .await
            .map_err(storage)?;

        Ok(document.map(Order::from))
    }
}

#[async_trait]
impl CallRequestStore for MongoStore {
    async fn record_call_request(&self, request: &CallRequest) -> Result<()> {
        let collections = self.collections().await?;

        collections
            .call_requests
            .insert_one(CallRequestDocument::from(request))
            .await
            .map_err(storage)?;

        Ok(())
    }
}
