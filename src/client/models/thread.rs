use std::collections::HashMap;

use crate::common::models::Comment;

/// Horizontal indent per nesting level, in pixels
pub const INDENT_UNIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadEntry<'a> {
    pub comment: &'a Comment,
    pub depth: usize,
}

impl ThreadEntry<'_> {
    pub fn indent(&self) -> usize {
        self.depth * INDENT_UNIT
    }
}

/// Flat comment list ordered as a depth-first walk of the reply forest.
///
/// Roots keep server order, siblings keep server order under their parent.
/// Comments whose parent is not in the list are left out.
#[derive(Debug, Clone)]
pub struct CommentThread<'a> {
    entries: Vec<ThreadEntry<'a>>,
    total: usize,
}

impl<'a> CommentThread<'a> {
    pub fn build(comments: &'a [Comment]) -> Self {
        let mut roots = Vec::new();
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, comment) in comments.iter().enumerate() {
            match comment.parent_id.as_deref() {
                None => roots.push(idx),
                Some(parent) => children.entry(parent).or_default().push(idx),
            }
        }

        let mut entries = Vec::with_capacity(comments.len());
        let mut emitted = vec![false; comments.len()];
        // explicit stack so deep reply chains cannot overflow
        let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&idx| (idx, 0)).collect();

        while let Some((idx, depth)) = stack.pop() {
            // duplicate ids could otherwise revisit a subtree forever
            if std::mem::replace(&mut emitted[idx], true) {
                continue;
            }
            let comment = &comments[idx];
            entries.push(ThreadEntry { comment, depth });
            if let Some(kids) = children.get(comment.id.as_str()) {
                stack.extend(kids.iter().rev().map(|&kid| (kid, depth + 1)));
            }
        }

        Self {
            entries,
            total: comments.len(),
        }
    }

    pub fn entries(&self) -> &[ThreadEntry<'a>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadEntry<'a>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comments dropped because their ancestry never reaches a root
    pub fn orphaned(&self) -> usize {
        self.total.saturating_sub(self.entries.len())
    }
}
