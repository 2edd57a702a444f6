//! Top-level per-frame animation driver.

use glam::Mat4;
use slotmap::SlotMap;

use crate::animation::clip::AnimationClip;
use crate::animation::node::{AnimationNode, BlendNode};
use crate::animation::pose::PoseSet;
use crate::animation::state::{AnimationState, AnimationVar, StateDesc, StateUpdate};
use crate::animation::transition::{Transition, TransitionUpdate};
use crate::animation::{NodeKey, StateKey, TransitionKey};
use crate::skeleton::{JointDirectory, MAX_TOTAL_JOINTS, SkeletonNode};

/// Owns one playback session: the shared [`JointDirectory`], the arenas of
/// animation nodes, states and transitions, the active state or transition,
/// and the flat skinning-matrix output array.
///
/// One `Animator` drives one character; a multi-character scene creates one
/// per character. The whole graph is wired up front through the `add_*`
/// methods, then stepped once per rendering frame with [`update`].
///
/// Invariant: after [`set_state`] has been called once, exactly one of
/// {current state, current transition} is set at any time.
///
/// [`update`]: Animator::update
/// [`set_state`]: Animator::set_state
#[derive(Debug)]
pub struct Animator {
    directory: JointDirectory,

    nodes: SlotMap<NodeKey, AnimationNode>,
    states: SlotMap<StateKey, AnimationState>,
    transitions: SlotMap<TransitionKey, Transition>,

    current_state: Option<StateKey>,
    current_transition: Option<TransitionKey>,

    /// One slot per joint ID; refreshed at the end of every [`update`] and
    /// uploaded verbatim by the renderer as shader uniform data.
    ///
    /// [`update`]: Animator::update
    skinning_matrices: Vec<Mat4>,
}

impl Animator {
    #[must_use]
    pub fn new(directory: JointDirectory) -> Self {
        Self {
            directory,
            nodes: SlotMap::with_key(),
            states: SlotMap::with_key(),
            transitions: SlotMap::with_key(),
            current_state: None,
            current_transition: None,
            skinning_matrices: vec![Mat4::IDENTITY; MAX_TOTAL_JOINTS],
        }
    }

    #[must_use]
    pub fn directory(&self) -> &JointDirectory {
        &self.directory
    }

    /// Mutable directory access for the mesh-import phase (joint
    /// registration).
    pub fn directory_mut(&mut self) -> &mut JointDirectory {
        &mut self.directory
    }

    // ========================================================================
    // Graph wiring
    // ========================================================================

    pub fn add_clip(&mut self, clip: AnimationClip) -> NodeKey {
        self.nodes.insert(AnimationNode::Clip(clip))
    }

    /// Wires a blend node over two existing sources.
    ///
    /// # Panics
    /// When either key is not in the node arena.
    pub fn add_blend(&mut self, source: NodeKey, target: NodeKey) -> NodeKey {
        let source_duration = self.nodes[source].duration();
        let target_duration = self.nodes[target].duration();
        self.nodes.insert(AnimationNode::Blend(BlendNode::new(
            source,
            target,
            source_duration,
            target_duration,
        )))
    }

    /// Adds a state wrapping `node`. Its completion time defaults to the
    /// node's full duration.
    pub fn add_state(&mut self, name: &str, node: NodeKey, desc: StateDesc) -> StateKey {
        let duration = self.nodes[node].duration();
        self.states
            .insert(AnimationState::new(name, node, duration, desc))
    }

    /// Adds a transition edge with a cross-fade of `duration` seconds.
    pub fn add_transition(
        &mut self,
        source: StateKey,
        target: StateKey,
        duration: f32,
    ) -> TransitionKey {
        assert!(
            self.states.contains_key(source) && self.states.contains_key(target),
            "transition endpoints must be wired states"
        );
        self.transitions
            .insert(Transition::new(source, target, duration))
    }

    pub fn set_on_complete_transition(&mut self, state: StateKey, transition: TransitionKey) {
        assert!(self.transitions.contains_key(transition));
        self.states[state].set_on_complete_transition(transition);
    }

    pub fn add_trigger_transition(
        &mut self,
        state: StateKey,
        trigger: &str,
        transition: TransitionKey,
    ) {
        assert!(self.transitions.contains_key(transition));
        self.states[state].add_trigger_transition(trigger, transition);
    }

    /// Overrides a state's completion threshold as a fraction of its
    /// source's duration (e.g. `0.7` to allow an early-exit transition at
    /// 70% of the clip).
    pub fn set_completion_time(&mut self, state: StateKey, fraction: f32) {
        let duration = self.nodes[self.states[state].node()].duration();
        self.states[state].set_completion_time(fraction, duration);
    }

    pub fn add_float_var(&mut self, state: StateKey, name: &str, value: f32, min: f32, max: f32) {
        self.states[state].add_var(name, AnimationVar::Float { value, min, max });
    }

    pub fn add_bool_var(&mut self, state: StateKey, name: &str, value: bool) {
        self.states[state].add_var(name, AnimationVar::Bool { value });
    }

    /// Enters the initial state.
    ///
    /// # Panics
    /// When a state is already current — the entry state is set exactly
    /// once; every later change goes through a transition.
    pub fn set_state(&mut self, state: StateKey) {
        assert!(
            self.current_state.is_none(),
            "animator already has a current state"
        );
        self.current_state = Some(state);
    }

    // ========================================================================
    // Per-frame driving
    // ========================================================================

    /// Advances the animation graph by `delta_time` seconds and recomputes
    /// every joint's skinning matrix.
    ///
    /// A transition that completes inside this call hands control to its
    /// target state, which is then advanced within the same frame so pose
    /// production never skips a beat.
    ///
    /// # Panics
    /// When no state has ever been set, or the directory has no skeleton
    /// hierarchy installed.
    pub fn update(&mut self, delta_time: f32) {
        if let Some(transition_key) = self.current_transition {
            let outcome =
                self.transitions[transition_key].update(delta_time, &mut self.states, &mut self.nodes);
            if outcome == TransitionUpdate::Finished {
                self.on_transition_finished(transition_key);
            }
        }

        if let Some(state_key) = self.current_state {
            let outcome = self.states[state_key].update(delta_time, &mut self.nodes, false);
            if let StateUpdate::Finished(transition) = outcome {
                self.on_state_finished(state_key, transition);
            }
        }

        self.refresh_skinning_matrices();
    }

    /// Fires a named trigger on the current state. If that state has a
    /// transition registered under the name, the transition begins
    /// immediately — triggers preempt regardless of playback time. While a
    /// transition is in flight there is no current state and the trigger
    /// has no effect.
    pub fn set_trigger(&mut self, name: &str) {
        if let Some(state_key) = self.current_state
            && let Some(transition) = self.states[state_key].trigger_transition(name)
        {
            self.on_state_finished(state_key, transition);
        }
    }

    /// Sets a float variable on the current state (driving its blend weight
    /// where applicable). No effect while transitioning.
    pub fn set_float(&mut self, name: &str, value: f32) {
        if let Some(state_key) = self.current_state {
            self.states[state_key].set_float(name, value, &mut self.nodes);
        }
    }

    /// Sets a bool variable on the current state. No effect while
    /// transitioning.
    pub fn set_bool(&mut self, name: &str, value: bool) {
        if let Some(state_key) = self.current_state {
            self.states[state_key].set_bool(name, value);
        }
    }

    // ========================================================================
    // State-machine coordination
    // ========================================================================

    /// Hands control from a finished (or preempted) state to one of its
    /// outgoing transitions.
    ///
    /// # Panics
    /// When `state` is not the current state, or a transition is already in
    /// flight (at-most-one-transition invariant).
    pub fn on_state_finished(&mut self, state: StateKey, transition: TransitionKey) {
        assert_eq!(
            self.current_state,
            Some(state),
            "finishing state is not the current state"
        );
        assert!(
            self.current_transition.is_none(),
            "a transition is already in flight"
        );

        log::debug!(
            "state '{}' finished, transitioning to '{}'",
            self.states[state].name(),
            self.states[self.transitions[transition].target()].name()
        );

        self.current_state = None;
        self.current_transition = Some(transition);
    }

    /// Hands control from a finished transition to its target state, and
    /// rewinds the source state if it is resettable.
    ///
    /// # Panics
    /// When `transition` is not the current transition, or a state is
    /// already current.
    pub fn on_transition_finished(&mut self, transition: TransitionKey) {
        assert_eq!(
            self.current_transition,
            Some(transition),
            "finishing transition is not the current transition"
        );
        assert!(
            self.current_state.is_none(),
            "a state is already current while a transition is finishing"
        );

        let source = self.transitions[transition].source();
        let target = self.transitions[transition].target();
        log::debug!("transitioned to state '{}'", self.states[target].name());

        self.current_transition = None;
        self.states[source].reset();
        self.current_state = Some(target);
    }

    // ========================================================================
    // Skinning output
    // ========================================================================

    fn refresh_skinning_matrices(&mut self) {
        let Some(root) = self.directory.root() else {
            panic!("joint directory has no skeleton hierarchy installed");
        };

        let poses: &PoseSet = if let Some(transition_key) = self.current_transition {
            self.transitions[transition_key].local_poses()
        } else if let Some(state_key) = self.current_state {
            self.states[state_key].local_poses(&self.nodes)
        } else {
            panic!("animator has neither a state nor a transition set");
        };

        Self::write_skinning_matrices(
            &self.directory,
            poses,
            root,
            Mat4::IDENTITY,
            &mut self.skinning_matrices,
        );
    }

    /// Depth-first pre-order walk: animated local pose where one exists,
    /// static bind transform otherwise; joints write
    /// `model_transform * inverse_bind_pose` into their output slot.
    fn write_skinning_matrices(
        directory: &JointDirectory,
        poses: &PoseSet,
        node: &SkeletonNode,
        parent_transform: Mat4,
        out: &mut [Mat4],
    ) {
        let local_transform = match poses.get(&node.name) {
            Some(pose) => pose.to_matrix(),
            None => node.transform,
        };

        let model_transform = parent_transform * local_transform;

        if let Some(joint) = directory.joint(&node.name) {
            out[joint.id] = model_transform * joint.inverse_bind_pose;
        }

        for child in &node.children {
            Self::write_skinning_matrices(directory, poses, child, model_transform, out);
        }
    }

    /// The flat skinning-matrix array, indexed by joint ID. Only valid after
    /// [`update`](Animator::update) has returned for the frame.
    #[must_use]
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning_matrices
    }

    /// The pose set currently authoritative for skinning: the active
    /// transition's blended poses while transitioning, else the current
    /// state's poses.
    ///
    /// # Panics
    /// Before any state has been set.
    #[must_use]
    pub fn local_poses(&self) -> &PoseSet {
        if let Some(transition_key) = self.current_transition {
            self.transitions[transition_key].local_poses()
        } else if let Some(state_key) = self.current_state {
            self.states[state_key].local_poses(&self.nodes)
        } else {
            panic!("animator has neither a state nor a transition set");
        }
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.current_transition.is_some()
    }

    #[must_use]
    pub fn current_state(&self) -> Option<StateKey> {
        self.current_state
    }

    #[must_use]
    pub fn state(&self, key: StateKey) -> &AnimationState {
        &self.states[key]
    }

    #[must_use]
    pub fn transition(&self, key: TransitionKey) -> &Transition {
        &self.transitions[key]
    }
}
