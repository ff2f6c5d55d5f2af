//! Business services
//!
//! - [`InventoryLedger`]: atomic stock adjustments
//! - [`DiscountService`]: discount evaluation and administration
//! - [`OrderStateMachine`]: status transitions and their side effects
//! - [`OrderService`]: checkout and order lookups
//! - [`CartService`]: per-user carts and guest cart merge
//! - [`CatalogService`], [`AccountService`], [`UploadService`]

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod discount;
pub mod inventory;
pub mod money;
pub mod order_number;
pub mod orders;
pub mod state_machine;
pub mod upload;

pub use accounts::AccountService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use discount::DiscountService;
pub use inventory::InventoryLedger;
pub use orders::OrderService;
pub use state_machine::OrderStateMachine;
pub use upload::{BlobStore, LocalBlobStore, UploadService};
