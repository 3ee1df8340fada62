//! Current-document cursor over a corpus of fixed size.
//!
//! The index is 1-based and always within `[1, len]`. `next` and `prev`
//! stop at the ends. `jump_to` clamps a target past the end to the last
//! document but ignores targets below 1; the two bounds are deliberately
//! handled differently to match existing behaviour.

/// 1-based position in a non-empty corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    index: usize,
    len: usize,
}

impl Navigator {
    /// A navigator on the first document, or `None` for an empty corpus.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 1, len })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Advance one document. Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        if self.index >= self.len {
            return false;
        }
        self.index += 1;
        true
    }

    /// Go back one document. Returns whether the index moved.
    pub fn prev(&mut self) -> bool {
        if self.index <= 1 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to document `target`. Returns whether the index moved.
    pub fn jump_to(&mut self, target: i64) -> bool {
        if target < 1 {
            return false;
        }
        let target = usize::try_from(target).unwrap_or(usize::MAX).min(self.len);
        let moved = target != self.index;
        self.index = target;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_has_no_navigator() {
        assert!(Navigator::new(0).is_none());
    }

    #[test]
    fn prev_at_start_is_noop() {
        let mut nav = Navigator::new(3).unwrap();
        assert!(!nav.prev());
        assert_eq!(nav.index(), 1);
    }

    #[test]
    fn next_at_end_is_noop() {
        let mut nav = Navigator::new(3).unwrap();
        assert!(nav.next());
        assert!(nav.next());
        assert!(!nav.next());
        assert_eq!(nav.index(), 3);
    }

    #[test]
    fn jump_past_end_clamps() {
        let mut nav = Navigator::new(4).unwrap();
        assert!(nav.jump_to(4 + 5));
        assert_eq!(nav.index(), 4);
        assert!(!nav.jump_to(i64::MAX));
        assert_eq!(nav.index(), 4);
    }

    #[test]
    fn jump_below_one_is_ignored() {
        let mut nav = Navigator::new(4).unwrap();
        nav.jump_to(3);
        assert!(!nav.jump_to(0));
        assert!(!nav.jump_to(-2));
        assert_eq!(nav.index(), 3);
    }

    #[test]
    fn single_document_corpus() {
        let mut nav = Navigator::new(1).unwrap();
        assert!(!nav.next());
        assert!(!nav.prev());
        assert!(!nav.jump_to(10));
        assert_eq!(nav.index(), 1);
    }
}
