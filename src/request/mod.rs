pub mod context;
pub mod headers;
pub mod signature;
