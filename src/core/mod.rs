pub mod cache;
pub mod log;
pub mod merge;
pub mod places;
pub mod summary;
pub mod timeline;
pub mod visits;
