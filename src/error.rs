use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The frame source has no more frames. Treated by the tracker loop
    /// as a clean shutdown trigger, not a failure.
    #[error("frame stream exhausted")]
    EndOfStream,

    #[error("frame source error: {0}")]
    FrameSource(String),
}
