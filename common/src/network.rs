pub mod payload;
pub mod target;
