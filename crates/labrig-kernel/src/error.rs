//! Error types for the engine.
//!
//! Planning, reservation and consumption failures are returned as typed values so
//! callers can choose their policy (reject vs. proceed partially, retry vs. abort).
//! Only store faults are expected to travel further, usually wrapped in the
//! crate-level [`EngineError`] and carried by [`error_stack::Report`] via
//! [`EngineResult`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use labrig_kernel::error::{EngineResult, IntoEngineReport};
//! use error_stack::ResultExt;
//!
//! fn start(engine: &ResourceEngine, run: RunId) -> EngineResult<()> {
//!     engine
//!         .plan_and_reserve(&requirements, &run, options)
//!         .into_report()
//!         .attach("reserving assets for run start")?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reservation::RunId;
use crate::resource::{ResourceId, ResourceStatus};

/// Faults raised by the inventory store or the reservation ledger.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write referenced an instance that is not in the inventory.
    #[error("resource '{0}' not found")]
    NotFound(ResourceId),

    /// The ledger refused a second active reservation for the same instance.
    #[error("resource '{0}' already has an active reservation")]
    ActiveReservationExists(ResourceId),

    /// A record failed validation when read back.
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// Which entity could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum GapSubject {
    Requirement(String),
    Instance(ResourceId),
}

/// A requirement or instance has no resolvable category.
///
/// Treated as a data-integrity problem in the upstream taxonomy: logged, and the
/// affected entity is excluded rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("no category for {subject:?} (type identifier: {type_identifier:?})")]
pub struct ClassificationGapError {
    pub subject: GapSubject,
    pub type_identifier: Option<String>,
}

/// A plan could not satisfy one or more mandatory requirements.
///
/// Not retried automatically; inventory state must change first.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("unmet requirements: {}", unmet.join(", "))]
pub struct UnmetRequirementError {
    pub unmet: Vec<String>,
}

/// Lost a race for an instance. Safe to retry the whole plan + reserve sequence
/// against a fresh inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource '{resource_id}' requested for '{requirement_name}' is already reserved by run '{held_by}'")]
pub struct ReservationConflict {
    pub resource_id: ResourceId,
    pub requirement_name: String,
    pub held_by: RunId,
}

impl ReservationConflict {
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// All errors returned by `reserve`.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ReserveError {
    #[error(transparent)]
    Conflict(#[from] ReservationConflict),

    /// The plan was incomplete; nothing was locked or written.
    #[error(transparent)]
    Unmet(#[from] UnmetRequirementError),

    /// The plan named an instance the inventory no longer knows.
    #[error("resource '{0}' is not in the inventory")]
    UnknownResource(ResourceId),

    /// The instance changed to a status that cannot be reserved since planning.
    #[error("resource '{resource_id}' cannot be reserved while {status}")]
    NotReservable {
        resource_id: ResourceId,
        status: ResourceStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReserveError {
    /// Whether re-planning against a fresh snapshot may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::NotReservable { .. })
    }
}

/// Attempted to consume more than remains.
///
/// Fatal to the current operation, not to the run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("resource '{resource_id}' has {remaining} remaining, cannot consume {requested}")]
pub struct ConsumableDepletedError {
    pub resource_id: ResourceId,
    pub requested: f64,
    pub remaining: f64,
}

/// All errors returned by the consumable tracker.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConsumeError {
    #[error(transparent)]
    Depleted(#[from] ConsumableDepletedError),

    #[error("invalid amount {amount} for resource '{resource_id}'")]
    InvalidAmount { resource_id: ResourceId, amount: f64 },

    #[error("resource '{0}' is not in the inventory")]
    UnknownResource(ResourceId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Crate-level error for host-facing paths (facade, config loading, CLI).
///
/// Wraps each component's typed error via `#[from]` so that `?` converts them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Reservation error: {0}")]
    Reserve(#[from] ReserveError),

    #[error("Consumable error: {0}")]
    Consume(#[from] ConsumeError),

    #[error("Planning error: {0}")]
    Unmet(#[from] UnmetRequirementError),

    /// A configuration-related error (requires the `config` feature).
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

/// Convenience result alias using [`error_stack::Report`].
pub type EngineResult<T> = Result<T, error_stack::Report<EngineError>>;

/// Lift a component result into [`EngineResult`].
pub trait IntoEngineReport<T> {
    /// Convert the error into [`EngineError`] and wrap it in an `error_stack::Report`.
    fn into_report(self) -> EngineResult<T>;
}

impl<T, E> IntoEngineReport<T> for Result<T, E>
where
    E: Into<EngineError>,
{
    #[inline]
    fn into_report(self) -> EngineResult<T> {
        self.map_err(|e| error_stack::Report::new(e.into()))
    }
}
