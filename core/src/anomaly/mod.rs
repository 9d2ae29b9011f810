pub mod baseline;
pub mod detector;
