use crate::composite::overlay::Transform;

/// Linear undo/redo log of committed overlay placements.
///
/// Never empty: the first snapshot is the initial placement and `cursor` always indexes a
/// snapshot. Pushing while not at the end discards the redo branch.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformHistory {
    snapshots: Vec<Transform>,
    cursor: usize,
}

impl TransformHistory {
    pub fn new(initial: Transform) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Transform {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn snapshots(&self) -> &[Transform] {
        &self.snapshots
    }

    pub fn push(&mut self, t: Transform) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(t);
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn undo(&mut self) -> Option<Transform> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(*self.current())
    }

    pub fn redo(&mut self) -> Option<Transform> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(*self.current())
    }

    /// Start over from a single snapshot.
    pub fn reset(&mut self, initial: Transform) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Transform {
        Transform {
            x,
            ..Transform::default()
        }
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut h = TransformHistory::new(at(0.0));
        h.push(at(1.0));
        h.push(at(2.0));
        assert_eq!(h.cursor(), 2);

        assert_eq!(h.undo(), Some(at(1.0)));
        assert_eq!(h.undo(), Some(at(0.0)));
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), Some(at(1.0)));
        assert_eq!(h.redo(), Some(at(2.0)));
        assert_eq!(h.redo(), None);
        assert_eq!(h.cursor(), 2);
        assert_eq!(*h.current(), at(2.0));
    }

    #[test]
    fn push_truncates_redo_branch() {
        let mut h = TransformHistory::new(at(0.0));
        h.push(at(1.0));
        h.push(at(2.0));
        h.undo();
        h.undo();
        h.push(at(9.0));
        assert_eq!(h.snapshots(), &[at(0.0), at(9.0)]);
        assert!(!h.can_redo());
        assert!(h.can_undo());
    }

    #[test]
    fn reset_keeps_single_snapshot() {
        let mut h = TransformHistory::new(at(0.0));
        h.push(at(1.0));
        h.reset(at(5.0));
        assert_eq!(h.len(), 1);
        assert_eq!(*h.current(), at(5.0));
        assert!(!h.can_undo());
    }
}
