#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! A skeletal animation runtime.
//!
//! The asset-import layer hands this crate a bind-pose skeleton hierarchy
//! plus per-clip keyframe channel sets; game logic fires triggers and sets
//! float variables; every frame one [`Animator::update`] call interpolates
//! poses, drives the state machine and refreshes a flat array of per-joint
//! skinning matrices for the renderer to upload as shader uniforms.

pub mod animation;
pub mod animator;
pub mod errors;
pub mod skeleton;

pub use animation::{
    AnimationClip, AnimationNode, AnimationState, AnimationVar, BlendNode, ClipSource,
    Interpolatable, JointChannel, JointClip, Keyframe, KeyframeTrack, LocalPose, NodeKey, PoseSet,
    StateDesc, StateKey, Transition, TransitionKey,
};
pub use animator::Animator;
pub use errors::{MarrowError, Result};
pub use skeleton::{Joint, JointDirectory, MAX_TOTAL_JOINTS, SkeletonNode};
