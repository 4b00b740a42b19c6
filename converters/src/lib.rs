pub mod check;
pub mod datasets;
