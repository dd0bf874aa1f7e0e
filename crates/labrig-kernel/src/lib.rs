//! labrig kernel: the resource model and the contracts every engine component is
//! written against.
//!
//! # Architecture
//!
//! - **Types and traits** live here: categories, instances, requirements, plans,
//!   reservations, and the store/oracle interfaces injected by the host application.
//! - **Concrete implementations** (matcher, selector, reservation manager, consumable
//!   tracker, in-memory stores) live in `labrig-foundation`.
//! - The kernel never depends on foundation.

// resource taxonomy
pub mod category;

// time source
pub mod clock;

// config loader
#[cfg(feature = "config")]
pub mod config;

// error module
pub mod error;

// collaborator contracts
pub mod inventory;

// assignment plans
pub mod plan;

// protocol requirements
pub mod requirement;

// reservation records
pub mod reservation;

// resource instances
pub mod resource;

pub use category::ResourceCategory;
pub use clock::{Clock, SystemClock};
pub use error::{
    ClassificationGapError, ConsumableDepletedError, ConsumeError, EngineError, EngineResult,
    GapSubject, IntoEngineReport, ReservationConflict, ReserveError, StoreError,
    UnmetRequirementError,
};
pub use inventory::{CategorySource, InventoryStore};
pub use plan::{AssignmentPlan, PlanOptions, RequirementAssignment};
pub use requirement::{AssetRequirement, LocationConstraint};
pub use reservation::{
    Reservation, ReservationLedger, ReservationSet, ReservationStatus, RunId, RunStateOracle,
};
pub use resource::{ResourceId, ResourceInstance, ResourceStatus};
