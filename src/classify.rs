//!
//! Field classifier: buckets the nodes of one section's tree by kind.

use crate::tree::{Body, Node, NodePath};
use crate::types::{FieldKind, IntRole};

/// Mutation candidates of one section, as paths from the section content
/// root, in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub bytes: Vec<NodePath>,
    pub repeat: Vec<NodePath>,
    pub unsigned_leb: Vec<NodePath>,
    pub signed_leb: Vec<NodePath>,
    pub fixed_width: Vec<NodePath>,
    /// `Const` nodes seen; never mutated.
    pub consts: usize,
    /// `Cond` nodes seen; never mutated.
    pub conds: usize,
}

impl Buckets {
    /// Candidates of `kind`. Kinds without a bucket yield an empty slice.
    pub fn get(&self, kind: FieldKind) -> &[NodePath] {
        match kind {
            FieldKind::Bytes => &self.bytes,
            FieldKind::Repeat => &self.repeat,
            FieldKind::UnsignedLebInt => &self.unsigned_leb,
            FieldKind::SignedLebInt => &self.signed_leb,
            FieldKind::FixedWidthInt => &self.fixed_width,
            FieldKind::Const | FieldKind::Cond | FieldKind::Struct => &[],
        }
    }

    fn get_mut(&mut self, kind: FieldKind) -> Option<&mut Vec<NodePath>> {
        match kind {
            FieldKind::Bytes => Some(&mut self.bytes),
            FieldKind::Repeat => Some(&mut self.repeat),
            FieldKind::UnsignedLebInt => Some(&mut self.unsigned_leb),
            FieldKind::SignedLebInt => Some(&mut self.signed_leb),
            FieldKind::FixedWidthInt => Some(&mut self.fixed_width),
            FieldKind::Const | FieldKind::Cond | FieldKind::Struct => None,
        }
    }

    /// Total number of bucketed candidates.
    pub fn len(&self) -> usize {
        FieldKind::BUCKETED.iter().map(|k| self.get(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies every node under `root` (the root itself included).
///
/// Each node lands in at most one bucket, chosen by its canonical kind.
/// Discriminant integers are skipped: they steer the decoding of later
/// fields, so changing one would desynchronise the tree from its bytes.
pub fn classify(root: &Node) -> Buckets {
    let mut buckets = Buckets::default();
    let mut path = Vec::new();
    walk(root, &mut path, &mut buckets);
    buckets
}

fn walk(node: &Node, path: &mut NodePath, buckets: &mut Buckets) {
    match &node.body {
        Body::Const(_) => buckets.consts += 1,
        Body::Cond(_) => buckets.conds += 1,
        Body::Int(int) if int.role == IntRole::Discriminant => {}
        _ => {
            if let Some(bucket) = buckets.get_mut(node.kind()) {
                bucket.push(path.clone());
            }
        }
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            path.push(i);
            walk(child, path, buckets);
            path.pop();
        }
    }
}
