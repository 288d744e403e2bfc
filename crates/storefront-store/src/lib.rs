//! # storefront-store
//!
//! MongoDB persistence for the storefront. Two collections:
//!
//! - `orders`: one document per paid checkout session, unique on `orderId`
//! - `callRequests`: append-only sales leads
//!
//! ```rust,ignore
//! use storefront_store::{MongoConfig, MongoStore};
//!
//! let store = Arc::new(MongoStore::new(MongoConfig::new(uri, "founderDB")));
//! // No connection yet; the first read or write connects.
//! ```

mod documents;
mod mongo;

pub use documents::{CallRequestDocument, OrderDocument};
pub use mongo::{MongoConfig, MongoStore};
