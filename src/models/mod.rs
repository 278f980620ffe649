pub mod day_summary;
pub mod place;
pub mod visit;
