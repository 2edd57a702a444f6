//! One playable animation asset.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::animation::joint_clip::JointClip;
use crate::animation::keyframes::Keyframe;
use crate::animation::pose::PoseSet;
use crate::errors::{MarrowError, Result};
use crate::skeleton::{JointDirectory, SkeletonNode};

/// Keyframe tracks for one animated joint, as extracted by the asset-import
/// layer from a single animation channel.
#[derive(Debug, Clone)]
pub struct JointChannel {
    pub joint_name: String,
    pub position_keys: Vec<Keyframe<Vec3>>,
    pub rotation_keys: Vec<Keyframe<Quat>>,
    pub scale_keys: Vec<Keyframe<Vec3>>,
}

/// Everything the import layer extracts from one animation file: the named
/// channel set, the authoring time domain, and the scene hierarchy the
/// animation was authored against.
#[derive(Debug, Clone)]
pub struct ClipSource {
    pub name: String,
    /// Authored length in animation-native "ticks".
    pub duration: f32,
    /// How many ticks the animation is intended to advance per second.
    pub ticks_per_second: f32,
    pub channels: Vec<JointChannel>,
    pub hierarchy: SkeletonNode,
}

/// A full animation: one [`JointClip`] per animated joint, driven together,
/// plus the cache of the local poses they last produced.
///
/// Channels may exist for joints that were never bound to vertices — nodes
/// that still move and carry their children's transforms. Conversely, a
/// joint with no authored channel simply never appears in the pose cache;
/// consumers fall back to its static bind transform.
#[derive(Debug)]
pub struct AnimationClip {
    name: String,
    joint_clips: FxHashMap<String, JointClip>,
    local_poses: PoseSet,
    duration: f32,
    ticks_per_second: f32,
}

impl AnimationClip {
    /// Builds the clip from an imported channel set and registers the
    /// source hierarchy with the shared [`JointDirectory`].
    ///
    /// The directory install is idempotent: the first clip of a model
    /// supplies the hierarchy, later clips are validated against it and a
    /// topology divergence fails with
    /// [`MarrowError::SkeletonMismatch`].
    pub fn new(
        source: ClipSource,
        directory: &mut JointDirectory,
        freeze_translation: bool,
    ) -> Result<Self> {
        if source.channels.is_empty() {
            return Err(MarrowError::EmptyClip { clip: source.name });
        }

        directory.set_root(source.hierarchy)?;

        let mut joint_clips = FxHashMap::default();
        for channel in source.channels {
            let joint_clip = JointClip::new(channel, freeze_translation)?;
            joint_clips.insert(joint_clip.name().to_string(), joint_clip);
        }

        log::info!(
            "loaded animation clip '{}': {} channels, {} ticks @ {} tps",
            source.name,
            joint_clips.len(),
            source.duration,
            source.ticks_per_second
        );

        Ok(Self {
            name: source.name,
            joint_clips,
            local_poses: PoseSet::default(),
            duration: source.duration,
            ticks_per_second: source.ticks_per_second,
        })
    }

    /// Evaluates every joint clip at `normalized_time` and refreshes the
    /// local pose cache.
    ///
    /// # Panics
    /// When `normalized_time` lies outside `[0, 1]`. Callers own the
    /// conversion from real time into the clip's normalized domain; an
    /// out-of-range value means that conversion is broken.
    pub fn update_local_poses(&mut self, normalized_time: f32) {
        assert!(
            (0.0..=1.0).contains(&normalized_time),
            "normalized time {normalized_time} outside [0, 1]"
        );

        let local_time = normalized_time * self.duration;
        for (name, joint_clip) in &mut self.joint_clips {
            joint_clip.update(local_time);
            self.local_poses
                .insert(name.clone(), joint_clip.local_pose().clone());
        }
    }

    #[must_use]
    pub fn local_poses(&self) -> &PoseSet {
        &self.local_poses
    }

    /// Authored length in ticks. Immutable after construction.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Authoring rate in ticks per second. Immutable after construction.
    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
