pub mod access;
pub mod catalog;
pub mod utils;

pub use access::{print_action_report, print_inspect_report, print_membership};
pub use catalog::{print_passes, print_roles, print_teams};
pub use utils::{format_id_set, format_status, truncate};
