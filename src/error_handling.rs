// Error handling module root
pub mod types;
