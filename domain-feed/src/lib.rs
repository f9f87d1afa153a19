pub mod feed;
pub mod sources;
