pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod negotiated;
pub mod state;
