//! Process-wide recency stack that assigns window stacking indices.
//!
//! This is the only writer of stacking indices. Dialogs and the visual layer read them through
//! [`ZOrderStack::z_index_of`].

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZOrderStack {
    base: u32,
    ceiling: u32,
    /// Least recent first.
    stack: Vec<String>,
    indices: HashMap<String, u32>,
    next_index: u32,
}

impl ZOrderStack {
    pub fn new(base: u32, ceiling: u32) -> Self {
        Self {
            base,
            ceiling: ceiling.max(base),
            stack: Vec::new(),
            indices: HashMap::new(),
            next_index: base,
        }
    }

    /// Makes `id` the most recent entry and renumbers every tracked window.
    pub fn bring_to_front(&mut self, id: &str) {
        self.stack.retain(|entry| entry != id);
        self.stack.push(id.to_string());
        self.renumber();
    }

    /// Drops `id` from the stack. Remaining indices are left as-is until the next renumber.
    pub fn remove_window(&mut self, id: &str) -> bool {
        let before = self.stack.len();
        self.stack.retain(|entry| entry != id);
        self.indices.remove(id);
        before != self.stack.len()
    }

    /// Replaces the stack with `ordered_ids` (least recent first), keeping only live ids.
    pub fn restore_stack<'a>(
        &mut self,
        ordered_ids: impl IntoIterator<Item = &'a str>,
        is_live: impl Fn(&str) -> bool,
    ) {
        self.stack.clear();
        self.indices.clear();
        for id in ordered_ids {
            if is_live(id) && !self.stack.iter().any(|entry| entry == id) {
                self.stack.push(id.to_string());
            }
        }
        self.renumber();
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.indices.clear();
        self.next_index = self.base;
    }

    pub fn z_index_of(&self, id: &str) -> Option<u32> {
        self.indices.get(id).copied()
    }

    /// Tracked ids, least recent first.
    pub fn ids(&self) -> &[String] {
        &self.stack
    }

    pub fn top(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stack.iter().any(|entry| entry == id)
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    fn index_at(&self, position: usize) -> u32 {
        let position = u32::try_from(position).unwrap_or(u32::MAX);
        self.base.saturating_add(position).min(self.ceiling)
    }

    fn renumber(&mut self) {
        self.indices.clear();
        for (position, id) in self.stack.iter().enumerate() {
            self.indices.insert(id.clone(), self.index_at(position));
        }
        self.next_index = self.index_at(self.stack.len());
    }
}
