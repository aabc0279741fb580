pub mod capture;
pub mod multiplexer;
pub mod subscriptions;
