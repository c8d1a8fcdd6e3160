mod clip;
mod time_range;

pub use clip::Clip;
pub use time_range::TimeRange;
