pub mod cancel;
pub mod lifecycle;
pub mod manager;
pub mod pool;
pub mod store;
