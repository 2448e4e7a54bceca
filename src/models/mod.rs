pub mod entry;
pub mod user;

pub use entry::LearningEntry;
pub use user::{SessionIdentity, User};
