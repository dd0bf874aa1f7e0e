//! Reservation records and the ledger contract.
//!
//! Reservations are stored arena-style in a durable ledger owned by the host
//! application. In-process exit-path guarantees (`Drop`, scoped guards) cannot
//! survive a crash, so the ledger is also the input of the stale-reservation sweep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::StoreError;
use crate::resource::{ResourceId, ResourceStatus};

/// Identity of one protocol execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random run id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Released,
}

/// An exclusive claim on one instance by one run, for one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub resource_id: ResourceId,
    pub run_id: RunId,
    pub requirement_name: String,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    /// Instance status observed when the hold was taken; restored on release.
    pub prior_status: ResourceStatus,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn new(
        resource_id: ResourceId,
        run_id: RunId,
        requirement_name: impl Into<String>,
        prior_status: ResourceStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id,
            run_id,
            requirement_name: requirement_name.into(),
            created_at,
            released_at: None,
            prior_status,
            status: ReservationStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Time elapsed since the hold was taken.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}

/// The holds created by one successful `reserve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationSet {
    pub run_id: RunId,
    pub reservations: Vec<Reservation>,
}

impl ReservationSet {
    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.reservations.iter().map(|r| &r.resource_id)
    }

    pub fn get(&self, resource_id: &ResourceId) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| &r.resource_id == resource_id)
    }
}

/// Durable store of reservation records.
///
/// Implementations must make `insert` fail with
/// [`StoreError::ActiveReservationExists`] when the resource already has an
/// active record, so the at-most-one-active invariant holds at the storage layer
/// as well as in the reservation manager.
pub trait ReservationLedger: Send + Sync {
    fn insert(&self, reservation: Reservation) -> Result<(), StoreError>;

    /// Delete a record created by an attempt that is being rolled back.
    fn remove(&self, reservation_id: Uuid) -> Result<(), StoreError>;

    /// Mark an active record released. Returns the updated record, or `None` if it
    /// was already released.
    fn mark_released(
        &self,
        reservation_id: Uuid,
        released_at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError>;

    fn active_for_resource(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Option<Reservation>, StoreError>;

    fn active_for_run(&self, run_id: &RunId) -> Result<Vec<Reservation>, StoreError>;

    fn active(&self) -> Result<Vec<Reservation>, StoreError>;
}

/// Execution-state oracle consulted by crash recovery.
pub trait RunStateOracle: Send + Sync {
    /// Whether the run is still live (queued or running) in the execution layer.
    fn is_run_live(&self, run_id: &RunId) -> bool;
}

impl<F> RunStateOracle for F
where
    F: Fn(&RunId) -> bool + Send + Sync,
{
    fn is_run_live(&self, run_id: &RunId) -> bool {
        self(run_id)
    }
}
