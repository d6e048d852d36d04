pub mod codec;
pub mod context;
pub mod service;
pub mod store;
