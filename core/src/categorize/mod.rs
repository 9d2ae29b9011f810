pub mod categorizer;
pub mod taxonomy;
