pub mod machines;
pub mod operators;
pub mod reports;
