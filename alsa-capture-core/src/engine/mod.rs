pub mod feed;
pub mod mock;
pub mod worker;
