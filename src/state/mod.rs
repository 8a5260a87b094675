pub mod invite;
pub mod project;

pub use invite::{InviteState, InviteStore, Listing};
pub use project::{ProjectState, ProjectStore};
