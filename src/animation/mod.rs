//! Animation runtime.
//!
//! Layered leaf-first:
//! - [`keyframes`]: generic time-keyed tracks with linear/spherical
//!   interpolation
//! - [`pose`]: decomposed per-joint local poses and pose blending
//! - [`joint_clip`] / [`clip`]: one joint's tracks, and a full imported
//!   animation
//! - [`node`]: playable sources (clips and two-source blend nodes)
//! - [`state`] / [`transition`]: the animator's state graph
//!
//! Nodes, states and transitions live in slotmap arenas owned by the
//! [`Animator`](crate::Animator) and reference each other through the
//! stable keys below, so the state graph can be cyclic without owning
//! pointers.

pub mod clip;
pub mod joint_clip;
pub mod keyframes;
pub mod node;
pub mod pose;
pub mod state;
pub mod transition;

pub use clip::{AnimationClip, ClipSource, JointChannel};
pub use joint_clip::JointClip;
pub use keyframes::{Interpolatable, Keyframe, KeyframeTrack};
pub use node::{AnimationNode, BlendNode};
pub use pose::{LocalPose, PoseSet, blend_poses};
pub use state::{AnimationState, AnimationVar, StateDesc};
pub use transition::Transition;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a playable animation source in the animator's node arena.
    pub struct NodeKey;
    /// Handle to a state in the animator's state graph.
    pub struct StateKey;
    /// Handle to a transition edge in the animator's state graph.
    pub struct TransitionKey;
}
