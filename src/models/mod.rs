pub mod catalog;
pub mod envelope;
pub mod membership;
pub mod patch;

// Re-export commonly used types
pub use catalog::{Role, Team};
pub use envelope::Envelope;
pub use membership::{PartialMembership, UserViews};
pub use patch::{MembershipPatch, RoleShape};
