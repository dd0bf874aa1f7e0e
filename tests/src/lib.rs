//! labrig Testing Framework
//!
//! Fixtures for exercising the engine deterministically: a manual clock, a
//! scriptable run-state oracle, inventory builders and a [`TestBed`] that wires
//! them into a [`ResourceEngine`](labrig_foundation::ResourceEngine).

pub mod clock;
pub mod fixtures;
pub mod oracle;

pub use clock::ManualClock;
pub use fixtures::TestBed;
pub use oracle::ScriptedRunOracle;

/// Assert the inventory status of an instance in a [`TestBed`].
#[macro_export]
macro_rules! assert_status {
    ($bed:expr, $id:expr, $status:expr) => {
        assert_eq!(
            $bed.status($id),
            $status,
            "unexpected status for instance {}",
            $id
        );
    };
}
