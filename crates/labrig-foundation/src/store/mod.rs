//! In-memory store backends
//!
//! Thread-safe implementations of the inventory and reservation-ledger
//! contracts, suitable for tests, simulation and single-process hosts. Durable
//! hosts supply their own implementations backed by a transactional database.

mod memory;

pub use memory::{InMemoryInventory, InMemoryReservationLedger};
