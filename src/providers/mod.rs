pub mod tracker_api;
pub mod util;

pub use tracker_api::TrackerApiProvider;
