//! Error Types
//!
//! Load-time data problems (empty keyframe channels, channel-less clips,
//! incompatible skeleton hierarchies) are reported as [`MarrowError`] values
//! so the asset pipeline can refuse a broken file with context. Runtime
//! precondition violations — out-of-range blend weights, mismatched blend
//! pose sets, state-machine invariant breaks — are wiring bugs in the state
//! graph and fail with a fatal assertion instead; see the panics documented
//! on the individual operations.

use thiserror::Error;

/// The main error type for the animation runtime.
#[derive(Error, Debug)]
pub enum MarrowError {
    /// A joint channel was supplied with an empty keyframe track. Every
    /// channel a clip claims to drive must carry at least one key per track.
    #[error("joint '{joint}' has no {channel} keyframes")]
    EmptyChannel {
        /// Name of the joint the channel targets
        joint: String,
        /// Which of the three tracks was empty ("position", "rotation", "scale")
        channel: &'static str,
    },

    /// An animation source carried no joint channels at all.
    #[error("animation clip '{clip}' has no channels")]
    EmptyClip {
        /// Name of the offending clip
        clip: String,
    },

    /// A clip was imported against a [`JointDirectory`](crate::JointDirectory)
    /// whose skeleton hierarchy does not match the clip's source hierarchy.
    #[error("skeleton hierarchy mismatch: expected node '{expected}', found '{found}'")]
    SkeletonMismatch {
        /// Node name in the already-installed hierarchy
        expected: String,
        /// Diverging node name in the incoming hierarchy
        found: String,
    },
}

/// Alias for `Result<T, MarrowError>`.
pub type Result<T> = std::result::Result<T, MarrowError>;
