pub mod fixture;
pub mod interface;
pub mod runtime;
