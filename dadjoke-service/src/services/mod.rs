pub mod providers;

pub use providers::{GenerationError, TextProvider};
