// Domain-driven module structure for the AIS packet reader.

// Core model
pub mod sentence;
pub mod message;
pub mod packet;

// Filtering
pub mod filter;
pub mod conf;

// Binary support
pub mod runtime;
