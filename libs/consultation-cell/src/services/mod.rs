pub mod assignment;
pub mod intake;
pub mod lifecycle;
pub mod store;
