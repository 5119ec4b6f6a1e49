pub mod store;

pub use store::{get_or_create, StateMap, StateStore};
