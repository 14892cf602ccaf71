//! Backtracking cursor over a slice
//!
//! Tentative parses take a `save()` checkpoint and `restore()` it on failure;
//! on success the checkpoint is simply dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

#[derive(Debug)]
pub struct Cursor<'a, T> {
    items: &'a [T],
    index: usize,
}

impl<'a, T> Cursor<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Cursor { items, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.index)
    }

    pub fn peek(&self) -> Option<&'a T> {
        self.items.get(self.index)
    }

    pub fn peek_at(&self, ahead: usize) -> Option<&'a T> {
        self.items.get(self.index + ahead)
    }

    pub fn next(&mut self) -> Option<&'a T> {
        let item = self.items.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    /// Consume the current item when `predicate` accepts it
    pub fn next_if(&mut self, predicate: impl FnOnce(&T) -> bool) -> Option<&'a T> {
        match self.peek() {
            Some(item) if predicate(item) => {
                self.index += 1;
                Some(item)
            }
            _ => None,
        }
    }

    pub fn save(&self) -> Checkpoint {
        Checkpoint(self.index)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.0;
    }

    /// Run a tentative parse; the cursor is rewound when it yields `None`
    pub fn attempt<R>(&mut self, parse: impl FnOnce(&mut Self) -> Option<R>) -> Option<R> {
        let checkpoint = self.save();
        let result = parse(self);
        if result.is_none() {
            self.restore(checkpoint);
        }
        result
    }
}
