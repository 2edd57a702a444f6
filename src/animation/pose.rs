//! Decomposed local poses and pose-set blending.

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;

/// The interpolated parent-relative transform of one joint at an instant,
/// kept in decomposed form so poses can be blended without the shear/skew
/// artifacts of naive matrix interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPose {
    pub joint_name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalPose {
    /// Recomposes the standard TRS local transform: translation, then
    /// rotation, then scale applied to the vertex.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// The set of local poses one animation source produced, keyed by joint name.
pub type PoseSet = FxHashMap<String, LocalPose>;

/// Blends two pose sets into `out` at parameter `t` (`0` = pure source,
/// `1` = pure target): translation and scale are lerped, rotation is slerped
/// and re-normalized.
///
/// # Panics
/// When the two sets differ in size or a joint of the source set is absent
/// from the target set. Blend sources must be authored against identical
/// skeletons; a mismatch is a content bug, not a runtime condition.
pub fn blend_poses(out: &mut PoseSet, source: &PoseSet, target: &PoseSet, t: f32) {
    assert_eq!(
        source.len(),
        target.len(),
        "blend sources must drive the same joint set"
    );

    for (name, source_pose) in source {
        let Some(target_pose) = target.get(name) else {
            panic!("joint '{name}' missing from blend target pose set");
        };

        out.insert(
            name.clone(),
            LocalPose {
                joint_name: source_pose.joint_name.clone(),
                translation: source_pose.translation.lerp(target_pose.translation, t),
                rotation: source_pose
                    .rotation
                    .slerp(target_pose.rotation, t)
                    .normalize(),
                scale: source_pose.scale.lerp(target_pose.scale, t),
            },
        );
    }
}
