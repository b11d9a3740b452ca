// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Query tree tracker
//!
//! Stack of the query trees currently being built. The top of the stack is
//! the tree new subqueries attach to as their parent.

use crate::graph::TreeId;

#[derive(Debug, Clone, Default)]
pub struct QueryTreeTracker {
    stack: Vec<TreeId>,
}

impl QueryTreeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tree: TreeId) {
        self.stack.push(tree);
    }

    pub fn pop(&mut self) -> Option<TreeId> {
        self.stack.pop()
    }

    /// Tree currently being built
    pub fn current(&self) -> Option<TreeId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
