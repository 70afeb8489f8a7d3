//! Persistence layer: Firestore for accounts, local key-value for guests.

pub mod firestore;
pub mod local;

pub use firestore::FirestoreDb;
pub use local::LocalStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Usage rows (keyed by owner id)
    pub const USAGE: &str = "usage";
}
