use serde_derive::{Deserialize, Serialize};

/// Tracker parameters. Distances are in pixels, the loop period in seconds.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrackerParams {
    /// Liveness budget granted to a person on every positive match; also the
    /// cumulative evidence a candidate needs before promotion.
    pub patience: i32,
    /// A person whose face similarity (distance) is below this value may be
    /// selected as the reference target.
    pub ref_similarity_threshold: f32,
    /// Maximum center-to-center distance for a detection to be claimed by an
    /// existing track.
    pub same_person_threshold: f32,
    /// Target tick period of the tracking loop (1 / sensor fps).
    pub period: f32,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            patience: 5,
            ref_similarity_threshold: 1.0,
            same_person_threshold: 80.0,
            period: 1.0 / 30.0,
        }
    }
}
