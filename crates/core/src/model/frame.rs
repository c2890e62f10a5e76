use flamelens_protocol::{FrameName, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of a frame, used to key colors and search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameKey(pub u64);

/// A node of the call-stack tree.
///
/// `start`/`end` are config-space time units; `depth` is the row, with the
/// root-level frames at depth 0. Children are owned by their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub key: FrameKey,
    pub name: FrameName,
    pub start: f64,
    pub end: f64,
    pub depth: u32,
    #[serde(default)]
    pub children: Vec<Frame>,
}

impl Frame {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The frame's box in config space: `[start,end] × [depth,depth+1]`.
    pub fn config_rect(&self) -> Rect {
        Rect::new(self.start, f64::from(self.depth), self.duration(), 1.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameTreeError {
    #[error("frame {key:?} has start {start} after end {end}")]
    InvertedBounds { key: FrameKey, start: f64, end: f64 },
    #[error("frame {child:?} extends outside its parent {parent:?}")]
    ChildOutsideParent { parent: FrameKey, child: FrameKey },
    #[error("frame {key:?} is at depth {actual}, expected {expected}")]
    DepthMismatch {
        key: FrameKey,
        expected: u32,
        actual: u32,
    },
}

/// The call-stack tree of one loaded profile/thread.
///
/// Built once by the loader and replaced wholesale when another profile or
/// thread is selected; nothing in this crate mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameTree {
    pub roots: Vec<Frame>,
}

impl FrameTree {
    pub fn new(roots: Vec<Frame>) -> Self {
        Self { roots }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Earliest root start, 0 for an empty tree.
    pub fn start(&self) -> f64 {
        finite_or_zero(self.roots.iter().map(|f| f.start).fold(f64::INFINITY, f64::min))
    }

    /// Latest root end, 0 for an empty tree.
    pub fn end(&self) -> f64 {
        finite_or_zero(self.roots.iter().map(|f| f.end).fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    pub fn max_depth(&self) -> u32 {
        let mut max = 0;
        let mut stack: Vec<&Frame> = self.roots.iter().collect();
        while let Some(frame) = stack.pop() {
            max = max.max(frame.depth);
            stack.extend(&frame.children);
        }
        max
    }

    pub fn frame_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Frame> = self.roots.iter().collect();
        while let Some(frame) = stack.pop() {
            count += 1;
            stack.extend(&frame.children);
        }
        count
    }

    /// Check the structural invariants: `start ≤ end`, children inside their
    /// parent, depth increasing by exactly one per level from 0.
    pub fn validate(&self) -> Result<(), FrameTreeError> {
        let mut stack: Vec<(&Frame, Option<&Frame>)> =
            self.roots.iter().map(|f| (f, None)).collect();
        while let Some((frame, parent)) = stack.pop() {
            if frame.start > frame.end {
                return Err(FrameTreeError::InvertedBounds {
                    key: frame.key,
                    start: frame.start,
                    end: frame.end,
                });
            }
            let expected = parent.map_or(0, |p| p.depth + 1);
            if frame.depth != expected {
                return Err(FrameTreeError::DepthMismatch {
                    key: frame.key,
                    expected,
                    actual: frame.depth,
                });
            }
            if let Some(p) = parent
                && (frame.start < p.start || frame.end > p.end)
            {
                return Err(FrameTreeError::ChildOutsideParent {
                    parent: p.key,
                    child: frame.key,
                });
            }
            stack.extend(frame.children.iter().map(|c| (c, Some(frame))));
        }
        Ok(())
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(key: u64, name: &str, start: f64, end: f64, depth: u32, children: Vec<Frame>) -> Frame {
        Frame {
            key: FrameKey(key),
            name: name.into(),
            start,
            end,
            depth,
            children,
        }
    }

    fn sample_tree() -> FrameTree {
        FrameTree::new(vec![
            frame(
                0,
                "main",
                0.0,
                100.0,
                0,
                vec![
                    frame(1, "parse", 0.0, 40.0, 1, vec![frame(3, "lex", 5.0, 20.0, 2, vec![])]),
                    frame(2, "render", 50.0, 90.0, 1, vec![]),
                ],
            ),
            frame(4, "idle", 100.0, 120.0, 0, vec![]),
        ])
    }

    #[test]
    fn bounds_and_depth() {
        let tree = sample_tree();
        assert!((tree.start() - 0.0).abs() < f64::EPSILON);
        assert!((tree.end() - 120.0).abs() < f64::EPSILON);
        assert!((tree.duration() - 120.0).abs() < f64::EPSILON);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.frame_count(), 5);
    }

    #[test]
    fn empty_tree_has_zero_duration() {
        let tree = FrameTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.duration(), 0.0);
        assert_eq!(tree.max_depth(), 0);
    }

    #[test]
    fn valid_tree_passes_validation() {
        assert_eq!(sample_tree().validate(), Ok(()));
    }

    #[test]
    fn child_outside_parent_is_rejected() {
        let tree = FrameTree::new(vec![frame(
            0,
            "main",
            0.0,
            10.0,
            0,
            vec![frame(1, "late", 5.0, 15.0, 1, vec![])],
        )]);
        assert_eq!(
            tree.validate(),
            Err(FrameTreeError::ChildOutsideParent {
                parent: FrameKey(0),
                child: FrameKey(1)
            })
        );
    }

    #[test]
    fn depth_gap_is_rejected() {
        let tree = FrameTree::new(vec![frame(
            0,
            "main",
            0.0,
            10.0,
            0,
            vec![frame(1, "skip", 1.0, 2.0, 2, vec![])],
        )]);
        assert!(matches!(
            tree.validate(),
            Err(FrameTreeError::DepthMismatch { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn config_rect_spans_one_row() {
        let f = frame(7, "x", 10.0, 30.0, 3, vec![]);
        assert_eq!(f.config_rect(), Rect::new(10.0, 3.0, 20.0, 1.0));
    }

    #[test]
    fn json_roundtrip() {
        let json = r#"{"roots":[{"key":1,"name":"main","start":0,"end":10,"depth":0,
            "children":[{"key":2,"name":"work","start":1,"end":4,"depth":1}]}]}"#;
        let tree = FrameTree::from_json(json.as_bytes()).expect("parses");
        assert_eq!(tree.frame_count(), 2);
        assert_eq!(tree.roots[0].children[0].name, "work");
        assert_eq!(tree.roots[0].children[0].key, FrameKey(2));
    }
}
