//! labrig foundation: concrete implementations of the requirement resolution,
//! auto-selection, reservation and consumable-depletion engine.
//!
//! Data flow: requirements + inventory snapshot → [`matcher`] → [`selector`] →
//! [`AssignmentPlan`](labrig_kernel::AssignmentPlan) → [`reservation`] (holds) →
//! execution → [`consumable`] (per-operation decrement) → release.

// engine configuration
pub mod config;

// consumable capacity tracking
pub mod consumable;

// facade over all components
pub mod engine;

// requirement matching
pub mod matcher;

// exclusive holds
pub mod reservation;

// candidate ranking and plan assembly
pub mod selector;

// in-memory stores
pub mod store;

// periodic crash recovery
pub mod sweeper;

// category resolution
pub mod taxonomy;

pub use config::EngineConfig;
pub use consumable::ConsumableTracker;
pub use engine::{ResourceEngine, ResourceEngineBuilder};
pub use matcher::eligible;
pub use reservation::{InstanceLocks, ReservationGuard, ReservationManager};
pub use selector::AutoSelector;
pub use store::{InMemoryInventory, InMemoryReservationLedger};
pub use sweeper::StaleReservationSweeper;
pub use taxonomy::{RequirementClass, StaticTaxonomy, Taxonomy};
