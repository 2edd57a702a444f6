//! Playable animation sources.
//!
//! An [`AnimationNode`] is anything a state can play: a clip, or a blend of
//! two other nodes. The variants form a closed set, so capability checks
//! (does this source support blend-weight control?) are plain matches
//! instead of runtime type inspection.

use slotmap::SlotMap;

use crate::animation::NodeKey;
use crate::animation::clip::AnimationClip;
use crate::animation::pose::{PoseSet, blend_poses};

/// Rate constant relating a normalized-duration source to real time: a node
/// of duration `d` plays at `30 / d` ticks per second, so every source
/// sweeps its normalized domain at the same wall-clock cadence.
const NORMALIZED_CLIP_RATE: f32 = 30.0;

/// One playable animation source in the animator's node arena.
#[derive(Debug)]
pub enum AnimationNode {
    Clip(AnimationClip),
    Blend(BlendNode),
}

impl AnimationNode {
    /// The pose set this node produced at its latest evaluation.
    #[must_use]
    pub fn local_poses(&self) -> &PoseSet {
        match self {
            AnimationNode::Clip(clip) => clip.local_poses(),
            AnimationNode::Blend(blend) => blend.local_poses(),
        }
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        match self {
            AnimationNode::Clip(clip) => clip.duration(),
            AnimationNode::Blend(blend) => blend.duration(),
        }
    }

    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        match self {
            AnimationNode::Clip(clip) => clip.ticks_per_second(),
            AnimationNode::Blend(blend) => blend.ticks_per_second(),
        }
    }

    /// The "settable blend weight" capability: present only on blend nodes.
    #[must_use]
    pub fn as_blend_mut(&mut self) -> Option<&mut BlendNode> {
        match self {
            AnimationNode::Blend(blend) => Some(blend),
            AnimationNode::Clip(_) => None,
        }
    }
}

/// Presents the interface of a single playable animation while internally
/// interpolating between two others at a runtime-controlled weight.
///
/// Children are referenced by arena key; their durations are immutable, so
/// they are snapshotted at wiring time for rate computation. A blend node's
/// own duration is the normalized `1.0`.
#[derive(Debug)]
pub struct BlendNode {
    source: NodeKey,
    target: NodeKey,
    source_duration: f32,
    target_duration: f32,

    local_poses: PoseSet,
    target_weight: f32,
    ticks_per_second: f32,
}

impl BlendNode {
    pub(crate) fn new(
        source: NodeKey,
        target: NodeKey,
        source_duration: f32,
        target_duration: f32,
    ) -> Self {
        let mut blend = Self {
            source,
            target,
            source_duration,
            target_duration,
            local_poses: PoseSet::default(),
            target_weight: 0.0,
            ticks_per_second: 0.0,
        };
        blend.set_target_weight(0.0);
        blend
    }

    /// Sets the blend weight (`0` = pure source, `1` = pure target) and
    /// recomputes the effective playback rate as the linear blend of the two
    /// children's natural rates, so apparent speed shifts smoothly with the
    /// weight instead of snapping.
    ///
    /// # Panics
    /// When `weight` lies outside `[0, 1]` — an out-of-range weight is a
    /// wiring bug in the state graph, never clamped.
    pub fn set_target_weight(&mut self, weight: f32) {
        assert!(
            (0.0..=1.0).contains(&weight),
            "blend weight {weight} outside [0, 1]"
        );
        self.target_weight = weight;

        let source_rate = NORMALIZED_CLIP_RATE / self.source_duration;
        let target_rate = NORMALIZED_CLIP_RATE / self.target_duration;
        self.ticks_per_second = source_rate + (target_rate - source_rate) * weight;
    }

    #[must_use]
    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    #[must_use]
    pub fn local_poses(&self) -> &PoseSet {
        &self.local_poses
    }

    /// Normalized duration: a blend node always spans `[0, 1]`.
    #[must_use]
    pub fn duration(&self) -> f32 {
        1.0
    }

    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }
}

/// Evaluates the node `key` at `time`, recursing through blend children.
///
/// A clip interprets `time` as its normalized domain; a blend node forwards
/// the same time value to both children, then blends every joint present in
/// both child pose sets at its current weight.
pub(crate) fn update_local_poses(
    nodes: &mut SlotMap<NodeKey, AnimationNode>,
    key: NodeKey,
    time: f32,
) {
    let blend_wiring = match &nodes[key] {
        AnimationNode::Blend(blend) => Some((blend.source, blend.target, blend.target_weight)),
        AnimationNode::Clip(_) => None,
    };

    match blend_wiring {
        None => {
            if let AnimationNode::Clip(clip) = &mut nodes[key] {
                clip.update_local_poses(time);
            }
        }
        Some((source, target, weight)) => {
            update_local_poses(nodes, source, time);
            update_local_poses(nodes, target, time);

            // Take the cache out so the two children can be read while the
            // blended poses are written.
            let mut blended = match &mut nodes[key] {
                AnimationNode::Blend(blend) => std::mem::take(&mut blend.local_poses),
                AnimationNode::Clip(_) => PoseSet::default(),
            };
            blend_poses(
                &mut blended,
                nodes[source].local_poses(),
                nodes[target].local_poses(),
                weight,
            );
            if let AnimationNode::Blend(blend) = &mut nodes[key] {
                blend.local_poses = blended;
            }
        }
    }
}
