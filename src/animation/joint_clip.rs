//! Per-joint keyframe interpolation.

use glam::{Quat, Vec3};

use crate::animation::clip::JointChannel;
use crate::animation::keyframes::KeyframeTrack;
use crate::animation::pose::LocalPose;
use crate::errors::{MarrowError, Result};

/// The state of one joint within a single animation: three keyframe tracks
/// plus the local pose derived from them by the latest [`update`].
///
/// [`update`]: JointClip::update
#[derive(Debug, Clone)]
pub struct JointClip {
    name: String,
    position_keys: KeyframeTrack<Vec3>,
    rotation_keys: KeyframeTrack<Quat>,
    scale_keys: KeyframeTrack<Vec3>,
    local_pose: LocalPose,
}

impl JointClip {
    /// Builds the joint's tracks from one imported channel.
    ///
    /// With `freeze_translation` set, only the channel's first position key
    /// is kept: the joint's translation stays fixed at the authored origin.
    /// Useful for root-motion-stripped locomotion clips blended in place.
    ///
    /// Each track must carry at least one key; an empty track is a content
    /// bug and fails with [`MarrowError::EmptyChannel`].
    pub fn new(channel: JointChannel, freeze_translation: bool) -> Result<Self> {
        let JointChannel {
            joint_name,
            mut position_keys,
            rotation_keys,
            scale_keys,
        } = channel;

        if position_keys.is_empty() {
            return Err(MarrowError::EmptyChannel {
                joint: joint_name,
                channel: "position",
            });
        }
        if rotation_keys.is_empty() {
            return Err(MarrowError::EmptyChannel {
                joint: joint_name,
                channel: "rotation",
            });
        }
        if scale_keys.is_empty() {
            return Err(MarrowError::EmptyChannel {
                joint: joint_name,
                channel: "scale",
            });
        }

        if freeze_translation {
            position_keys.truncate(1);
        }

        let local_pose = LocalPose {
            joint_name: joint_name.clone(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        };

        Ok(Self {
            name: joint_name,
            position_keys: KeyframeTrack::new(position_keys),
            rotation_keys: KeyframeTrack::new(rotation_keys),
            scale_keys: KeyframeTrack::new(scale_keys),
            local_pose,
        })
    }

    /// Recomputes the local pose at `animation_time` (in the clip's native
    /// ticks). Translation, rotation and scale interpolate independently;
    /// the rotation is re-normalized before the pose is recomposed.
    pub fn update(&mut self, animation_time: f32) {
        self.local_pose.translation = self.position_keys.sample(animation_time);
        self.local_pose.rotation = self.rotation_keys.sample(animation_time).normalize();
        self.local_pose.scale = self.scale_keys.sample(animation_time);
    }

    #[must_use]
    pub fn local_pose(&self) -> &LocalPose {
        &self.local_pose
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
