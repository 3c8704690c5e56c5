pub mod list_file;
pub mod roster;

pub use list_file::{JsonListFile, ListRecord};
pub use roster::Roster;
