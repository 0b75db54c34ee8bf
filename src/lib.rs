pub mod bbox;
pub mod config;
pub mod detection;
pub mod error;
pub mod flow;
pub mod frame;
pub mod registry;
pub mod tracker;

mod track;

pub use config::TrackerParams;
pub use detection::DetectionBatch;
pub use error::Error;
pub use flow::{FlowEstimator, FlowField};
pub use frame::{FrameCell, FramePair, FrameSource};
pub use track::{FaceBinding, Track, TrackStatus};
pub use tracker::{PeopleTracker, TrackerHandle};
