pub mod error;
pub mod span;
pub mod squad;
pub mod utils;
