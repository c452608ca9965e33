pub mod headers;
pub mod message;
