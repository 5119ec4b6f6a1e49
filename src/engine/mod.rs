pub mod classifier;
pub mod decision;

pub use classifier::classify;
pub use decision::{decide, Decision};
