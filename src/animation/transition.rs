//! Timed cross-fade between two states.

use slotmap::SlotMap;

use crate::animation::node::AnimationNode;
use crate::animation::pose::{PoseSet, blend_poses};
use crate::animation::state::AnimationState;
use crate::animation::{NodeKey, StateKey};

/// Outcome of advancing a transition by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionUpdate {
    /// Still cross-fading; the blended pose cache is fresh.
    Blending,
    /// Elapsed time reached the duration. The transition has already
    /// rewound itself for its next traversal; the animator should hand
    /// control to the target state.
    Finished,
}

/// A cross-blend edge of the state graph.
///
/// Created once at wiring time and reused for every traversal of the edge:
/// on completion the elapsed clock rewinds to zero so the next activation
/// starts clean. While active, both endpoint states keep advancing their own
/// clocks — the source keeps living through the fade, it is not frozen.
#[derive(Debug)]
pub struct Transition {
    source: StateKey,
    target: StateKey,

    /// Cross-fade length in seconds.
    duration: f32,
    elapsed: f32,

    local_poses: PoseSet,
}

impl Transition {
    pub(crate) fn new(source: StateKey, target: StateKey, duration: f32) -> Self {
        Self {
            source,
            target,
            duration,
            elapsed: 0.0,
            local_poses: PoseSet::default(),
        }
    }

    /// Accumulates elapsed time; reports [`TransitionUpdate::Finished`] once
    /// the duration is reached (before advancing either state that frame),
    /// otherwise updates both endpoint states and blends their pose sets at
    /// `elapsed / duration`.
    pub(crate) fn update(
        &mut self,
        delta_time: f32,
        states: &mut SlotMap<StateKey, AnimationState>,
        nodes: &mut SlotMap<NodeKey, AnimationNode>,
    ) -> TransitionUpdate {
        self.elapsed += delta_time;

        if self.elapsed >= self.duration {
            // Ready for the next traversal of this edge.
            self.elapsed = 0.0;
            return TransitionUpdate::Finished;
        }

        let t = self.elapsed / self.duration;

        // Both states keep living during the cross-fade. Their own
        // on-complete transitions are suppressed while this one is active.
        let _ = states[self.source].update(delta_time, nodes, true);
        let _ = states[self.target].update(delta_time, nodes, true);

        let source_poses = states[self.source].local_poses(nodes);
        let target_poses = states[self.target].local_poses(nodes);
        blend_poses(&mut self.local_poses, source_poses, target_poses, t);

        TransitionUpdate::Blending
    }

    /// The blended pose set from the latest active frame.
    #[must_use]
    pub fn local_poses(&self) -> &PoseSet {
        &self.local_poses
    }

    #[must_use]
    pub fn source(&self) -> StateKey {
        self.source
    }

    #[must_use]
    pub fn target(&self) -> StateKey {
        self.target
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}
