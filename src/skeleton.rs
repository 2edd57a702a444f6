//! Bind-pose skeleton model.
//!
//! A model's skeleton arrives from the asset-import layer in two pieces:
//!
//! - per-joint inverse bind matrices together with skin weights (registered
//!   through [`JointDirectory::append_joint`] while meshes are parsed), and
//! - the scene hierarchy of named nodes with parent-relative bind transforms
//!   (installed once through [`JointDirectory::set_root`]).
//!
//! Not every [`SkeletonNode`] is a joint: some nodes carry no skin weights
//! and exist only to propagate a parent transform to descendant joints.

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::errors::{MarrowError, Result};

/// Fixed capacity of the skinning-matrix array, one slot per joint ID.
/// Mirrors the uniform array size the renderer uploads per draw.
pub const MAX_TOTAL_JOINTS: usize = 100;

/// One skeletal joint, i.e. a node that is bound to vertices.
///
/// `id` indexes the flat skinning-matrix array; `inverse_bind_pose` maps
/// model space at bind time into joint-local space. Created once per unique
/// joint name and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub id: usize,
    pub inverse_bind_pose: Mat4,
}

/// A node of the bind-pose hierarchy tree, mirroring the source scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    pub name: String,
    /// Parent-relative bind transform.
    pub transform: Mat4,
    pub children: Vec<SkeletonNode>,
}

impl SkeletonNode {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
        }
    }

    /// Builder-style child attachment for hand-wired hierarchies.
    #[must_use]
    pub fn with_child(mut self, child: SkeletonNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Registry of joints discovered across a model's meshes, plus the owned
/// bind-pose hierarchy.
///
/// The same joint may be described in several meshes of one model; joints
/// are keyed by name so a repeat encounter resolves to the joint already
/// loaded. IDs are assigned sequentially on first sight and are stable for
/// the directory's lifetime.
#[derive(Debug, Default)]
pub struct JointDirectory {
    directory: FxHashMap<String, Joint>,
    root: Option<SkeletonNode>,
    joints_loaded: usize,
}

impl JointDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains_joint(&self, name: &str) -> bool {
        self.directory.contains_key(name)
    }

    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.directory.get(name)
    }

    /// Number of distinct joints registered so far.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints_loaded
    }

    /// Registers a joint and returns its ID.
    ///
    /// Idempotent: a name that was already appended keeps its original ID
    /// and inverse bind pose, and the joint count does not grow.
    ///
    /// # Panics
    /// When registering a new joint would exceed [`MAX_TOTAL_JOINTS`].
    pub fn append_joint(&mut self, name: &str, inverse_bind_pose: Mat4) -> usize {
        if let Some(joint) = self.directory.get(name) {
            return joint.id;
        }
        assert!(
            self.joints_loaded < MAX_TOTAL_JOINTS,
            "joint capacity exceeded: cannot register '{name}' (limit {MAX_TOTAL_JOINTS})"
        );

        let id = self.joints_loaded;
        self.directory.insert(
            name.to_string(),
            Joint {
                id,
                inverse_bind_pose,
            },
        );
        self.joints_loaded += 1;
        id
    }

    /// Installs the bind-pose hierarchy.
    ///
    /// The first call takes ownership of `root`. Every later call (each
    /// animation file of the same model re-supplies its hierarchy) checks
    /// that the incoming tree is structurally identical to the installed one
    /// and returns [`MarrowError::SkeletonMismatch`] where they diverge.
    pub fn set_root(&mut self, root: SkeletonNode) -> Result<()> {
        match &self.root {
            None => {
                self.root = Some(root);
                Ok(())
            }
            Some(existing) => match first_mismatch(existing, &root) {
                None => Ok(()),
                Some((expected, found)) => Err(MarrowError::SkeletonMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                }),
            },
        }
    }

    /// The bind-pose hierarchy root, once installed.
    #[must_use]
    pub fn root(&self) -> Option<&SkeletonNode> {
        self.root.as_ref()
    }
}

/// Walks two hierarchies in lockstep and reports the first pair of nodes at
/// which they diverge (by name or child count).
fn first_mismatch<'a>(a: &'a SkeletonNode, b: &'a SkeletonNode) -> Option<(&'a str, &'a str)> {
    if a.name != b.name || a.children.len() != b.children.len() {
        return Some((&a.name, &b.name));
    }
    a.children
        .iter()
        .zip(&b.children)
        .find_map(|(ca, cb)| first_mismatch(ca, cb))
}
