//! One node of the animator's state graph.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::animation::node::{self, AnimationNode};
use crate::animation::pose::PoseSet;
use crate::animation::{NodeKey, TransitionKey};

/// Playback policy of a state, fixed at wiring time.
#[derive(Debug, Clone, Copy)]
pub struct StateDesc {
    /// Wrap playback time and play forever.
    pub should_loop: bool,
    /// Whether [`AnimationState::reset`] rewinds the state. Non-resettable
    /// states keep their clock across re-entries (e.g. a one-shot landing
    /// clip whose completion is externally driven).
    pub is_resettable: bool,
}

impl Default for StateDesc {
    fn default() -> Self {
        Self {
            should_loop: false,
            is_resettable: true,
        }
    }
}

/// A named, range-bounded control variable on a state. The closed set of
/// variable kinds: floats (which can drive a blend weight), booleans for
/// game logic, and triggers — the latter realized by the state's
/// trigger-transition map rather than a variant here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationVar {
    Float { value: f32, min: f32, max: f32 },
    Bool { value: bool },
}

/// Outcome of advancing a state by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StateUpdate {
    /// The state advanced and its source produced fresh poses.
    Advanced,
    /// The state reached its completion time; the carried transition now
    /// owns pose production. The source was not advanced this frame.
    Finished(TransitionKey),
}

/// One state of the implicit finite-state machine: a playable source, a
/// local playback clock, loop/reset policy, and the outgoing transition
/// edges (by trigger name, or on completion).
#[derive(Debug)]
pub struct AnimationState {
    name: String,
    node: NodeKey,

    /// Accumulated playback time, in the source's native ticks.
    time: f32,
    should_loop: bool,
    is_resettable: bool,
    /// Tick count at which this state counts as finished. Defaults to the
    /// source's full duration; may be lowered for early-exit transitions.
    completion_time: f32,

    vars: FxHashMap<String, AnimationVar>,

    on_complete: Option<TransitionKey>,
    on_trigger: FxHashMap<String, TransitionKey>,
}

impl AnimationState {
    pub(crate) fn new(name: &str, node: NodeKey, duration: f32, desc: StateDesc) -> Self {
        Self {
            name: name.to_string(),
            node,
            time: 0.0,
            should_loop: desc.should_loop,
            is_resettable: desc.is_resettable,
            completion_time: duration,
            vars: FxHashMap::default(),
            on_complete: None,
            on_trigger: FxHashMap::default(),
        }
    }

    /// Advances the playback clock by `delta_time` seconds and evaluates the
    /// wrapped source at the resulting normalized time.
    ///
    /// Looping states wrap modulo the completion time. A non-looping state
    /// that has reached its completion time reports
    /// [`StateUpdate::Finished`] with its on-complete transition — unless
    /// the animator is already mid-transition (`in_transition`), in which
    /// case the state keeps evaluating with its time clamped to the valid
    /// domain.
    pub(crate) fn update(
        &mut self,
        delta_time: f32,
        nodes: &mut SlotMap<NodeKey, AnimationNode>,
        in_transition: bool,
    ) -> StateUpdate {
        self.time += delta_time * nodes[self.node].ticks_per_second();

        if self.should_loop {
            if self.completion_time > 0.0 {
                self.time %= self.completion_time;
            }
        } else if self.time >= self.completion_time
            && !in_transition
            && let Some(transition) = self.on_complete
        {
            return StateUpdate::Finished(transition);
        }

        let duration = nodes[self.node].duration();
        let normalized = if duration > 0.0 {
            (self.time / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        node::update_local_poses(nodes, self.node, normalized);

        StateUpdate::Advanced
    }

    /// Rewinds playback to the start — silently ignored on non-resettable
    /// states.
    pub fn reset(&mut self) {
        if self.is_resettable {
            self.time = 0.0;
        }
    }

    /// Lowers (or restores) the completion threshold to `fraction` of the
    /// source's duration, enabling early-exit transitions.
    pub(crate) fn set_completion_time(&mut self, fraction: f32, duration: f32) {
        self.completion_time = fraction * duration;
    }

    pub(crate) fn set_on_complete_transition(&mut self, transition: TransitionKey) {
        self.on_complete = Some(transition);
    }

    pub(crate) fn add_trigger_transition(&mut self, trigger: &str, transition: TransitionKey) {
        self.on_trigger.insert(trigger.to_string(), transition);
    }

    /// The transition registered under `trigger`, if any.
    #[must_use]
    pub fn trigger_transition(&self, trigger: &str) -> Option<TransitionKey> {
        self.on_trigger.get(trigger).copied()
    }

    pub(crate) fn add_var(&mut self, name: &str, var: AnimationVar) {
        self.vars.insert(name.to_string(), var);
    }

    #[must_use]
    pub fn var(&self, name: &str) -> Option<&AnimationVar> {
        self.vars.get(name)
    }

    /// Sets a float variable. When the wrapped source is a blend node, the
    /// variable drives its blend weight through `t = (value - min) / max` —
    /// the denominator is deliberately `max`, not `max - min`; changing it
    /// changes animator-visible blend behavior.
    ///
    /// Unknown names and non-float variables are ignored.
    pub(crate) fn set_float(
        &mut self,
        name: &str,
        new_value: f32,
        nodes: &mut SlotMap<NodeKey, AnimationNode>,
    ) {
        let Some(AnimationVar::Float { value, min, max }) = self.vars.get_mut(name) else {
            return;
        };
        *value = new_value;
        let (min, max) = (*min, *max);

        if let Some(blend) = nodes[self.node].as_blend_mut() {
            let t = (new_value - min) / max;
            blend.set_target_weight(t);
        }
    }

    /// Sets a bool variable; unknown names and non-bool variables are
    /// ignored.
    pub(crate) fn set_bool(&mut self, name: &str, new_value: bool) {
        if let Some(AnimationVar::Bool { value }) = self.vars.get_mut(name) {
            *value = new_value;
        }
    }

    /// The pose set this state's source produced at its latest evaluation.
    #[must_use]
    pub fn local_poses<'a>(&self, nodes: &'a SlotMap<NodeKey, AnimationNode>) -> &'a PoseSet {
        nodes[self.node].local_poses()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn node(&self) -> NodeKey {
        self.node
    }

    /// Current playback time in the source's native ticks.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn completion_time(&self) -> f32 {
        self.completion_time
    }

    #[must_use]
    pub fn is_resettable(&self) -> bool {
        self.is_resettable
    }
}
