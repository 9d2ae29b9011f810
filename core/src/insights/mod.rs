pub mod generator;
pub mod history;
pub mod model;
