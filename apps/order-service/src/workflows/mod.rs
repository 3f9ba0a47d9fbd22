//! Application workflows.
//!
//! One workflow per operation: place, take, list. Each validates its own
//! input before touching any collaborator, orchestrates the ports, and maps
//! store/resolver failures into the [`crate::error::OrderError`] taxonomy.
//! Workflows are generic over their ports, so tests drive them with mocks.

pub mod list_orders;
pub mod place_order;
pub mod take_order;

pub use list_orders::ListOrdersWorkflow;
pub use place_order::PlaceOrderWorkflow;
pub use take_order::TakeOrderWorkflow;
