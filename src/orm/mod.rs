pub mod choices;
pub mod questions;
pub mod sessions;
pub mod users;
pub mod votes;
