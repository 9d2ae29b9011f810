pub mod media;
pub mod model;
