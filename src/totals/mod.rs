pub mod allocate;
pub mod calculator;
pub mod types;
