//! Database layer (Firestore, with an in-process store for development).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness claims, one per registered address
    pub const EMAILS: &str = "emails";
    pub const GOALS: &str = "goals";
    pub const WORKOUTS: &str = "workouts";
}
