use std::collections::HashMap;

use super::frame::{Frame, FrameKey, FrameTree};

/// Row of a frame in a [`FlattenedFrames`] list.
///
/// Every derived per-frame buffer (positions, colors, bounds, search flags)
/// is addressed by this index. It is also how a "current" frame is held
/// without borrowing into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameIndex(pub usize);

#[derive(Debug, Clone, Copy)]
struct FlatFrame<'a> {
    frame: &'a Frame,
    parent: Option<FrameIndex>,
}

/// Pre-order view of every frame in a [`FrameTree`], indexed `0..N`.
///
/// Rebuild it whenever the tree is replaced; the borrow makes a stale list
/// impossible to keep around.
#[derive(Debug, Clone)]
pub struct FlattenedFrames<'a> {
    frames: Vec<FlatFrame<'a>>,
    by_key: HashMap<FrameKey, FrameIndex>,
}

impl<'a> FlattenedFrames<'a> {
    pub fn new(tree: &'a FrameTree) -> Self {
        let mut frames = Vec::with_capacity(tree.frame_count());
        let mut by_key = HashMap::new();

        // Reverse pushes keep siblings in their original order.
        let mut stack: Vec<(&'a Frame, Option<FrameIndex>)> =
            tree.roots.iter().rev().map(|f| (f, None)).collect();
        while let Some((frame, parent)) = stack.pop() {
            let index = FrameIndex(frames.len());
            frames.push(FlatFrame { frame, parent });
            by_key.entry(frame.key).or_insert(index);
            stack.extend(frame.children.iter().rev().map(|c| (c, Some(index))));
        }

        Self { frames, by_key }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: FrameIndex) -> Option<&'a Frame> {
        self.frames.get(index.0).map(|f| f.frame)
    }

    pub fn index_of(&self, key: FrameKey) -> Option<FrameIndex> {
        self.by_key.get(&key).copied()
    }

    pub fn parent(&self, index: FrameIndex) -> Option<FrameIndex> {
        self.frames.get(index.0).and_then(|f| f.parent)
    }

    /// Indices from the frame's parent up to its root-level ancestor.
    pub fn ancestors(&self, index: FrameIndex) -> impl Iterator<Item = FrameIndex> + '_ {
        std::iter::successors(self.parent(index), |i| self.parent(*i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Frame> + '_ {
        self.frames.iter().map(|f| f.frame)
    }
}
