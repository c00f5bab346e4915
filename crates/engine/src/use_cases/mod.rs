//! Use cases orchestrating the registry against the host ports.

pub mod distress;
pub mod groups;

pub use distress::{CallContext, CallId, CallReport, DistressOps};
pub use groups::{AddOutcome, GroupError, GroupListing, GroupOps, RemovalOutcome};
