//! Animator & State Machine Tests
//!
//! Tests for:
//! - State playback, looping and completion-time semantics
//! - Trigger and on-complete transitions, transition edge reuse
//! - Blend nodes driven through float variables
//! - The exactly-one-in-flight animator invariant
//! - End-to-end skinning-matrix computation over a three-joint spine

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

use marrow::animation::clip::{AnimationClip, ClipSource, JointChannel};
use marrow::animation::keyframes::Keyframe;
use marrow::animation::{StateDesc, StateKey};
use marrow::animator::Animator;
use marrow::skeleton::{JointDirectory, SkeletonNode};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// root -> mid -> tip, each offset one unit up from its parent.
fn spine() -> SkeletonNode {
    SkeletonNode::new("root", Mat4::IDENTITY).with_child(
        SkeletonNode::new("mid", Mat4::from_translation(Vec3::Y))
            .with_child(SkeletonNode::new("tip", Mat4::from_translation(Vec3::Y))),
    )
}

/// Registers the spine's joints with bind-consistent inverse bind poses.
fn register_spine_joints(directory: &mut JointDirectory) -> (usize, usize, usize) {
    let root = directory.append_joint("root", Mat4::IDENTITY);
    let mid = directory.append_joint("mid", Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)));
    let tip = directory.append_joint("tip", Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)));
    (root, mid, tip)
}

/// A one-second clip rotating "mid" from identity to `end_rotation`.
fn mid_rotation_clip(name: &str, end_rotation: Quat) -> ClipSource {
    ClipSource {
        name: name.to_string(),
        duration: 1.0,
        ticks_per_second: 1.0,
        channels: vec![JointChannel {
            joint_name: "mid".to_string(),
            position_keys: vec![Keyframe::new(Vec3::Y, 0.0)],
            rotation_keys: vec![
                Keyframe::new(Quat::IDENTITY, 0.0),
                Keyframe::new(end_rotation, 1.0),
            ],
            scale_keys: vec![Keyframe::new(Vec3::ONE, 0.0)],
        }],
        hierarchy: spine(),
    }
}

/// A clip translating "mid" along a straight segment, for blend tests.
fn mid_translation_clip(name: &str, from: Vec3, to: Vec3, duration: f32) -> ClipSource {
    ClipSource {
        name: name.to_string(),
        duration,
        ticks_per_second: 1.0,
        channels: vec![JointChannel {
            joint_name: "mid".to_string(),
            position_keys: vec![Keyframe::new(from, 0.0), Keyframe::new(to, duration)],
            rotation_keys: vec![Keyframe::new(Quat::IDENTITY, 0.0)],
            scale_keys: vec![Keyframe::new(Vec3::ONE, 0.0)],
        }],
        hierarchy: spine(),
    }
}

/// Idle/locomotion pair wired with a "locomote" trigger transition.
fn idle_locomotion_animator(transition_duration: f32) -> (Animator, StateKey, StateKey) {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);

    let idle_clip = AnimationClip::new(
        mid_rotation_clip("idle", Quat::from_rotation_x(0.1)),
        &mut directory,
        false,
    )
    .unwrap();
    let locomotion_clip = AnimationClip::new(
        mid_rotation_clip("locomotion", Quat::from_rotation_y(FRAC_PI_2)),
        &mut directory,
        false,
    )
    .unwrap();

    let mut animator = Animator::new(directory);
    let idle_node = animator.add_clip(idle_clip);
    let locomotion_node = animator.add_clip(locomotion_clip);

    let looping = StateDesc {
        should_loop: true,
        ..StateDesc::default()
    };
    let idle = animator.add_state("idle", idle_node, looping);
    let locomotion = animator.add_state("locomotion", locomotion_node, looping);

    let transition = animator.add_transition(idle, locomotion, transition_duration);
    animator.add_trigger_transition(idle, "locomote", transition);

    animator.set_state(idle);
    (animator, idle, locomotion)
}

/// One state wrapping a blend of two translation clips, driven by "speed".
fn blend_animator(min: f32, max: f32) -> (Animator, StateKey) {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);

    let a = AnimationClip::new(
        mid_translation_clip("a", Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0),
        &mut directory,
        false,
    )
    .unwrap();
    let b = AnimationClip::new(
        mid_translation_clip("b", Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 5.0, 0.0), 3.0),
        &mut directory,
        false,
    )
    .unwrap();

    let mut animator = Animator::new(directory);
    let a_node = animator.add_clip(a);
    let b_node = animator.add_clip(b);
    let blend = animator.add_blend(a_node, b_node);

    let state = animator.add_state("move", blend, StateDesc::default());
    animator.add_float_var(state, "speed", min, min, max);
    animator.set_state(state);
    (animator, state)
}

// ============================================================================
// State playback
// ============================================================================

#[test]
fn looping_state_never_exceeds_completion_time() {
    let (mut animator, idle, _) = idle_locomotion_animator(0.3);

    for _ in 0..100 {
        animator.update(0.07);
        let state = animator.state(idle);
        assert!(
            state.time() < state.completion_time(),
            "looped time {} reached completion time {}",
            state.time(),
            state.completion_time()
        );
    }
}

#[test]
fn finished_state_without_on_complete_clamps_evaluation() {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);
    let clip = AnimationClip::new(
        mid_rotation_clip("fall", Quat::from_rotation_y(FRAC_PI_2)),
        &mut directory,
        false,
    )
    .unwrap();

    let mut animator = Animator::new(directory);
    let node = animator.add_clip(clip);
    let state = animator.add_state("fall", node, StateDesc::default());
    animator.set_state(state);

    // Far past the end: time keeps accumulating, evaluation clamps.
    animator.update(2.5);
    assert!(approx(animator.state(state).time(), 2.5));

    let pose = &animator.local_poses()["mid"];
    assert!(pose.rotation.angle_between(Quat::from_rotation_y(FRAC_PI_2)) < EPSILON);
}

#[test]
fn on_complete_transition_fires_at_completion_time() {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);
    let fall_clip = AnimationClip::new(
        mid_rotation_clip("fall", Quat::from_rotation_x(0.5)),
        &mut directory,
        false,
    )
    .unwrap();
    let land_clip = AnimationClip::new(
        mid_rotation_clip("land", Quat::IDENTITY),
        &mut directory,
        false,
    )
    .unwrap();

    let mut animator = Animator::new(directory);
    let fall_node = animator.add_clip(fall_clip);
    let land_node = animator.add_clip(land_clip);

    let fall = animator.add_state("fall", fall_node, StateDesc::default());
    let land = animator.add_state(
        "land",
        land_node,
        StateDesc {
            should_loop: true,
            ..StateDesc::default()
        },
    );
    let roll = animator.add_transition(fall, land, 0.1);
    animator.set_completion_time(fall, 0.7);
    animator.set_on_complete_transition(fall, roll);
    animator.set_state(fall);

    animator.update(0.5); // time 0.5 < 0.7: still falling
    assert!(!animator.is_transitioning());
    assert_eq!(animator.current_state(), Some(fall));

    // time 0.8 >= 0.7: exits before the clip's natural end.
    animator.update(0.3);
    assert!(animator.is_transitioning());
    assert_eq!(animator.current_state(), None);

    animator.update(0.1); // cross-fade elapses
    assert!(!animator.is_transitioning());
    assert_eq!(animator.current_state(), Some(land));
}

// ============================================================================
// Triggers and transitions
// ============================================================================

#[test]
fn trigger_preempts_immediately() {
    let (mut animator, _, _) = idle_locomotion_animator(0.3);

    animator.update(0.05);
    assert!(!animator.is_transitioning());

    // Fires regardless of playback position.
    animator.set_trigger("locomote");
    assert!(animator.is_transitioning());
    assert_eq!(animator.current_state(), None);
}

#[test]
fn unknown_trigger_is_ignored() {
    let (mut animator, idle, _) = idle_locomotion_animator(0.3);

    animator.update(0.05);
    animator.set_trigger("teleport");
    assert!(!animator.is_transitioning());
    assert_eq!(animator.current_state(), Some(idle));
}

#[test]
fn trigger_during_transition_has_no_effect() {
    let (mut animator, _, _) = idle_locomotion_animator(0.3);

    animator.set_trigger("locomote");
    animator.update(0.05);
    assert!(animator.is_transitioning());

    // No current state mid-transition: the trigger routes nowhere.
    animator.set_trigger("locomote");
    assert!(animator.is_transitioning());
    assert_eq!(animator.current_state(), None);
}

#[test]
fn transition_edge_is_reused_across_traversals() {
    let (mut animator, idle, locomotion) = idle_locomotion_animator(0.2);
    let back = animator.add_transition(locomotion, idle, 0.2);
    animator.add_trigger_transition(locomotion, "halt", back);

    let run_transition = |animator: &mut Animator| {
        for _ in 0..4 {
            animator.update(0.05);
        }
    };

    animator.set_trigger("locomote");
    run_transition(&mut animator);
    assert_eq!(animator.current_state(), Some(locomotion));

    animator.set_trigger("halt");
    run_transition(&mut animator);
    assert_eq!(animator.current_state(), Some(idle));

    // Same edge again: its elapsed clock rewound on completion.
    animator.set_trigger("locomote");
    run_transition(&mut animator);
    assert_eq!(animator.current_state(), Some(locomotion));
}

#[test]
fn resettable_source_state_rewinds_after_transition() {
    let (mut animator, idle, locomotion) = idle_locomotion_animator(0.2);

    animator.update(0.05);
    assert!(animator.state(idle).time() > 0.0);

    animator.set_trigger("locomote");
    for _ in 0..4 {
        animator.update(0.05);
    }
    assert_eq!(animator.current_state(), Some(locomotion));
    assert!(approx(animator.state(idle).time(), 0.0));
}

#[test]
fn non_resettable_source_state_keeps_its_clock() {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);
    let land_clip = AnimationClip::new(
        mid_rotation_clip("land", Quat::from_rotation_x(0.2)),
        &mut directory,
        false,
    )
    .unwrap();
    let idle_clip = AnimationClip::new(
        mid_rotation_clip("idle", Quat::IDENTITY),
        &mut directory,
        false,
    )
    .unwrap();

    let mut animator = Animator::new(directory);
    let land_node = animator.add_clip(land_clip);
    let idle_node = animator.add_clip(idle_clip);

    let land = animator.add_state(
        "land",
        land_node,
        StateDesc {
            should_loop: true,
            is_resettable: false,
        },
    );
    let idle = animator.add_state(
        "idle",
        idle_node,
        StateDesc {
            should_loop: true,
            ..StateDesc::default()
        },
    );
    let transition = animator.add_transition(land, idle, 0.2);
    animator.add_trigger_transition(land, "recovered", transition);
    animator.set_state(land);

    animator.update(0.05);
    animator.set_trigger("recovered");
    for _ in 0..4 {
        animator.update(0.05);
    }
    assert_eq!(animator.current_state(), Some(idle));
    assert!(animator.state(land).time() > 0.0);
}

// ============================================================================
// Animator invariants
// ============================================================================

#[test]
fn exactly_one_of_state_or_transition_is_active() {
    let (mut animator, _, _) = idle_locomotion_animator(0.3);

    let check = |animator: &Animator| {
        let state_set = animator.current_state().is_some();
        let transitioning = animator.is_transitioning();
        assert!(state_set ^ transitioning, "invariant broken");
    };

    for i in 0..30 {
        if i == 4 {
            animator.set_trigger("locomote");
        }
        animator.update(0.05);
        check(&animator);
    }
}

#[test]
#[should_panic(expected = "finishing state is not the current state")]
fn on_state_finished_while_transitioning_is_fatal() {
    let (mut animator, idle, locomotion) = idle_locomotion_animator(0.3);
    let second = animator.add_transition(idle, locomotion, 0.3);

    animator.set_trigger("locomote");
    assert!(animator.is_transitioning());

    // At most one transition may be in flight.
    animator.on_state_finished(idle, second);
}

#[test]
#[should_panic(expected = "already has a current state")]
fn set_state_twice_is_fatal() {
    let (mut animator, idle, _) = idle_locomotion_animator(0.3);
    animator.set_state(idle);
}

#[test]
#[should_panic(expected = "neither a state nor a transition")]
fn update_before_any_state_is_fatal() {
    init_logging();
    let mut directory = JointDirectory::new();
    register_spine_joints(&mut directory);
    directory.set_root(spine()).unwrap();

    let mut animator = Animator::new(directory);
    animator.update(0.05);
}

// ============================================================================
// Blend nodes and float variables
// ============================================================================

#[test]
fn blend_weight_zero_reproduces_source() {
    let (mut animator, _) = blend_animator(0.0, 1.0);

    animator.set_float("speed", 0.0);
    animator.update(0.0);

    let pose = &animator.local_poses()["mid"];
    assert!(pose.translation.abs_diff_eq(Vec3::ZERO, EPSILON));
}

#[test]
fn blend_weight_one_reproduces_target() {
    let (mut animator, _) = blend_animator(0.0, 1.0);

    animator.set_float("speed", 1.0);
    animator.update(0.0);

    let pose = &animator.local_poses()["mid"];
    assert!(pose.translation.abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), EPSILON));
}

#[test]
fn blend_intermediate_weight_lies_on_segment() {
    let (mut animator, _) = blend_animator(0.0, 1.0);

    animator.set_float("speed", 0.5);
    animator.update(0.0);

    // Halfway between (0,0,0) and (0,5,0) at time zero.
    let pose = &animator.local_poses()["mid"];
    assert!(pose.translation.abs_diff_eq(Vec3::new(0.0, 2.5, 0.0), EPSILON));
}

#[test]
fn float_var_normalizes_by_max_not_by_range() {
    // var range [2, 10]: value 6 maps to (6 - 2) / 10 = 0.4, not 0.5.
    let (mut animator, _) = blend_animator(2.0, 10.0);

    animator.set_float("speed", 6.0);
    animator.update(0.0);

    let pose = &animator.local_poses()["mid"];
    assert!(pose.translation.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPSILON));
}

#[test]
fn blend_weight_shifts_effective_playback_rate() {
    // Source duration 2 -> rate 15; target duration 3 -> rate 10.
    let (mut animator, state) = blend_animator(0.0, 1.0);

    animator.set_float("speed", 1.0);
    animator.update(0.1);
    assert!(approx(animator.state(state).time(), 1.0));
}

#[test]
fn blend_rate_at_weight_zero_is_source_rate() {
    let (mut animator, state) = blend_animator(0.0, 1.0);

    animator.set_float("speed", 0.0);
    animator.update(0.1);
    assert!(approx(animator.state(state).time(), 1.5));
}

#[test]
#[should_panic(expected = "blend weight")]
fn out_of_range_blend_weight_is_fatal() {
    let (mut animator, _) = blend_animator(0.0, 1.0);

    // Maps to t = 2.0: a wiring bug, never clamped.
    animator.set_float("speed", 2.0);
}

// ============================================================================
// End-to-end skinning
// ============================================================================

#[test]
fn trigger_transition_end_to_end_skinning() {
    let (mut animator, _, locomotion) = idle_locomotion_animator(0.3);
    let (root_id, mid_id, tip_id) = {
        let d = animator.directory();
        (
            d.joint("root").unwrap().id,
            d.joint("mid").unwrap().id,
            d.joint("tip").unwrap().id,
        )
    };

    animator.set_trigger("locomote");
    for _ in 0..6 {
        animator.update(0.05);
    }

    // 6 x 0.05 covers the 0.3s cross-fade exactly.
    assert!(!animator.is_transitioning());
    assert_eq!(animator.current_state(), Some(locomotion));

    // Locomotion advanced 0.3s at 1 tick/s: its "mid" pose is the clip's
    // pose at t = 0.3, with no residual blend contribution from idle.
    let time = animator.state(locomotion).time();
    let expected_rotation = Quat::IDENTITY
        .slerp(Quat::from_rotation_y(FRAC_PI_2), time / 1.0)
        .normalize();
    let mid_local = Mat4::from_scale_rotation_translation(Vec3::ONE, expected_rotation, Vec3::Y);

    // root: unanimated, bind transform is identity.
    let root_model = Mat4::IDENTITY;
    let mid_model = root_model * mid_local;
    let tip_model = mid_model * Mat4::from_translation(Vec3::Y);

    let matrices = animator.skinning_matrices();
    let tip_expected = tip_model * Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0));
    let mid_expected = mid_model * Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));

    assert!(matrices[root_id].abs_diff_eq(Mat4::IDENTITY, 1e-3));
    assert!(
        matrices[mid_id].abs_diff_eq(mid_expected, 1e-3),
        "mid skinning matrix mismatch"
    );
    assert!(
        matrices[tip_id].abs_diff_eq(tip_expected, 1e-3),
        "tip skinning matrix mismatch"
    );

    // Slots beyond the registered joints stay identity.
    assert!(matrices[tip_id + 1].abs_diff_eq(Mat4::IDENTITY, 1e-6));
}
