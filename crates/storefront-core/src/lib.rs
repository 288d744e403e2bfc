//! # storefront-core
//!
//! Domain model for the digital-goods storefront: the product catalog, cart
//! pricing, order and call-request records, and the storage traits the
//! records are written through.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   line items   ┌──────────────┐   paid session   ┌──────────────┐
//! │   Cart   │───────────────▶│   Provider   │─────────────────▶│  OrderStore  │
//! │ (pricing)│                │  (checkout)  │                  │ (once/session)│
//! └──────────┘                └──────────────┘                  └──────────────┘
//! ```
//!
//! The catalog is validated once at startup and shared read-only. Stores
//! only ever append.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;
pub mod store;

pub use cart::{Cart, CartItem, LineItem};
pub use catalog::{Catalog, CatalogDefinition, CatalogEntry, EntryKind};
pub use error::{Result, StorefrontError};
pub use order::{CallRequest, CallRequestForm, CallRequestPolicy, Order, OrderOutcome};
pub use store::{CallRequestStore, MemoryStore, OrderStore};
