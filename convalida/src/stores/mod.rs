//! In-memory implementations of the store boundaries.

pub mod memory;

pub use memory::{
    InMemoryEquivalenceStore, InMemoryGradeStore, InMemoryInstitutionStore, InMemorySubjectStore,
    InMemoryTransferHistory,
};
