//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage traits.
//! It is intended for embedded usage, tests, and as a reference implementation.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::debug;

use crate::entity::{Direction, EntityKind, NodeId, Relationship};
use crate::model::{Bookmark, BookmarkId, Node, UserId};
use crate::query::{Query, ResultOrder};
use crate::storage::traits::{
    BookmarkStore, GraphOps, GraphStore, GraphTransaction, StorageError,
};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Clone)]
struct StoredNode {
    seq: u64,
    node: Node,
}

type EdgeKey = (NodeId, Relationship);

#[derive(Debug, Default)]
struct GraphState {
    nodes: HashMap<NodeId, StoredNode>,
    order: BTreeMap<u64, NodeId>,
    next_seq: u64,
    outgoing: HashMap<EdgeKey, Vec<NodeId>>,
    incoming: HashMap<EdgeKey, Vec<NodeId>>,
}

fn created_at(node: &Node) -> Option<DateTime<FixedOffset>> {
    node.property("created")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

impl GraphState {
    fn kind_of(&self, id: NodeId) -> Result<EntityKind, StorageError> {
        self.nodes
            .get(&id)
            .map(|stored| stored.node.kind)
            .ok_or(StorageError::NodeNotFound(id))
    }

    fn execute(&self, query: &Query) -> Vec<Node> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let matching = self
            .order
            .iter()
            .filter_map(|(seq, id)| self.nodes.get(id).map(|stored| (*seq, &stored.node)))
            .filter(|(_, node)| query.matches(node));
        let results: Vec<Node> = match query.order {
            ResultOrder::Insertion => matching.take(limit).map(|(_, node)| node.clone()).collect(),
            ResultOrder::NewestFirst => {
                // Sorts like `ORDER BY n.created DESC`: nodes without a
                // timestamp lead, equal timestamps go latest-saved first.
                let mut found: Vec<(Option<DateTime<FixedOffset>>, u64, &Node)> = matching
                    .map(|(seq, node)| (created_at(node), seq, node))
                    .collect();
                found.sort_by(|(ta, sa, _), (tb, sb, _)| {
                    (tb.is_none(), tb, sb).cmp(&(ta.is_none(), ta, sa))
                });
                found
                    .into_iter()
                    .take(limit)
                    .map(|(_, _, node)| node.clone())
                    .collect()
            }
        };
        debug!(
            kind = %query.kind,
            limit = ?query.limit,
            returned = results.len(),
            "graph query executed"
        );
        results
    }

    fn get(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).map(|stored| stored.node.clone())
    }

    fn save(&mut self, node: Node) -> Result<(), StorageError> {
        if let Some(stored) = self.nodes.get_mut(&node.id) {
            if stored.node.kind != node.kind {
                return Err(StorageError::KindMismatch {
                    id: node.id,
                    expected: stored.node.kind,
                    actual: node.kind,
                });
            }
            stored.node = node;
            return Ok(());
        }

        let seq = self.next_seq;
        self.next_seq = self
            .next_seq
            .checked_add(1)
            .ok_or_else(|| StorageError::BackendError("node sequence overflow".to_string()))?;
        self.order.insert(seq, node.id);
        self.nodes.insert(node.id, StoredNode { seq, node });
        Ok(())
    }

    fn connect(
        &mut self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<(), StorageError> {
        let from_kind = self.kind_of(from)?;
        let to_kind = self.kind_of(to)?;
        if relationship.endpoints() != (from_kind, to_kind) {
            return Err(StorageError::InvalidEdge {
                relationship,
                from: from_kind,
                to: to_kind,
            });
        }

        let targets = self.outgoing.entry((from, relationship)).or_default();
        if targets.contains(&to) {
            return Ok(());
        }
        let replaced: Vec<NodeId> = if relationship.is_single() {
            std::mem::take(targets)
        } else {
            Vec::new()
        };
        targets.push(to);

        for old in replaced {
            self.remove_incoming(old, relationship, from);
        }
        self.incoming.entry((to, relationship)).or_default().push(from);
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, relationship: Relationship, to: NodeId) -> bool {
        let removed = match self.outgoing.get_mut(&(from, relationship)) {
            Some(targets) => {
                let before = targets.len();
                targets.retain(|t| *t != to);
                let removed = targets.len() != before;
                if targets.is_empty() {
                    self.outgoing.remove(&(from, relationship));
                }
                removed
            }
            None => false,
        };
        if removed {
            self.remove_incoming(to, relationship, from);
        }
        removed
    }

    fn remove_incoming(&mut self, to: NodeId, relationship: Relationship, from: NodeId) {
        if let Some(sources) = self.incoming.get_mut(&(to, relationship)) {
            sources.retain(|s| *s != from);
            if sources.is_empty() {
                self.incoming.remove(&(to, relationship));
            }
        }
    }

    fn related(
        &self,
        id: NodeId,
        relationship: Relationship,
        direction: Direction,
    ) -> Result<Vec<Node>, StorageError> {
        self.kind_of(id)?;
        let index = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        Ok(index
            .get(&(id, relationship))
            .map(|ids| ids.iter().filter_map(|other| self.get(*other)).collect())
            .unwrap_or_default())
    }

    fn count(&self, kind: EntityKind) -> usize {
        self.nodes.values().filter(|s| s.node.kind == kind).count()
    }
}

/// Thread-safe in-memory property graph.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphOps for InMemoryGraphStore {
    fn execute(&self, query: &Query) -> Result<Vec<Node>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.execute"))?;
        Ok(state.execute(query))
    }

    fn get(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.get"))?;
        Ok(state.get(id))
    }

    fn save(&self, node: Node) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.save"))?;
        state.save(node)
    }

    fn connect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.connect"))?;
        state.connect(from, relationship, to)
    }

    fn disconnect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<bool, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.disconnect"))?;
        Ok(state.disconnect(from, relationship, to))
    }

    fn related(
        &self,
        id: NodeId,
        relationship: Relationship,
        direction: Direction,
    ) -> Result<Vec<Node>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.related"))?;
        state.related(id, relationship, direction)
    }

    fn count(&self, kind: EntityKind) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("graph.count"))?;
        Ok(state.count(kind))
    }
}

impl GraphStore for InMemoryGraphStore {
    fn transaction(&self) -> Result<Box<dyn GraphTransaction + '_>, StorageError> {
        let guard = self.state.write().map_err(|_| lock_err("graph.transaction"))?;
        Ok(Box::new(InMemoryTransaction {
            guard: RefCell::new(guard),
            undo: RefCell::new(UndoLog::default()),
        }))
    }
}

/// Prior values of everything a transaction touched, recorded on first
/// touch.
#[derive(Debug, Default)]
struct UndoLog {
    next_seq: Option<u64>,
    nodes: HashMap<NodeId, Option<StoredNode>>,
    outgoing: HashMap<EdgeKey, Option<Vec<NodeId>>>,
    incoming: HashMap<EdgeKey, Option<Vec<NodeId>>>,
}

impl UndoLog {
    fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.outgoing.is_empty() && self.incoming.is_empty()
    }

    fn record_node(&mut self, state: &GraphState, id: NodeId) {
        self.next_seq.get_or_insert(state.next_seq);
        self.nodes
            .entry(id)
            .or_insert_with(|| state.nodes.get(&id).cloned());
    }

    fn record_outgoing(&mut self, state: &GraphState, key: EdgeKey) {
        self.outgoing
            .entry(key)
            .or_insert_with(|| state.outgoing.get(&key).cloned());
    }

    fn record_incoming(&mut self, state: &GraphState, key: EdgeKey) {
        self.incoming
            .entry(key)
            .or_insert_with(|| state.incoming.get(&key).cloned());
    }

    fn rollback(self, state: &mut GraphState) {
        for (id, previous) in self.nodes {
            if let Some(current) = state.nodes.remove(&id) {
                state.order.remove(&current.seq);
            }
            if let Some(previous) = previous {
                state.order.insert(previous.seq, id);
                state.nodes.insert(id, previous);
            }
        }
        if let Some(seq) = self.next_seq {
            state.next_seq = seq;
        }
        restore_edges(&mut state.outgoing, self.outgoing);
        restore_edges(&mut state.incoming, self.incoming);
    }
}

fn restore_edges(
    index: &mut HashMap<EdgeKey, Vec<NodeId>>,
    saved: HashMap<EdgeKey, Option<Vec<NodeId>>>,
) {
    for (key, previous) in saved {
        match previous {
            Some(ids) => {
                index.insert(key, ids);
            }
            None => {
                index.remove(&key);
            }
        }
    }
}

/// Transaction over [`InMemoryGraphStore`].
///
/// Holds the store's write lock and writes through to the shared graph,
/// logging the prior value of each touched node and edge list. Dropping
/// the transaction without committing replays the log.
pub struct InMemoryTransaction<'a> {
    guard: RefCell<RwLockWriteGuard<'a, GraphState>>,
    undo: RefCell<UndoLog>,
}

impl GraphOps for InMemoryTransaction<'_> {
    fn execute(&self, query: &Query) -> Result<Vec<Node>, StorageError> {
        Ok(self.guard.borrow().execute(query))
    }

    fn get(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.guard.borrow().get(id))
    }

    fn save(&self, node: Node) -> Result<(), StorageError> {
        let mut guard = self.guard.borrow_mut();
        let state: &mut GraphState = &mut guard;
        self.undo.borrow_mut().record_node(state, node.id);
        state.save(node)
    }

    fn connect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<(), StorageError> {
        let mut guard = self.guard.borrow_mut();
        let state: &mut GraphState = &mut guard;
        let mut undo = self.undo.borrow_mut();
        undo.record_outgoing(state, (from, relationship));
        undo.record_incoming(state, (to, relationship));
        if relationship.is_single() {
            // The replaced target loses its incoming edge.
            for old in state.outgoing.get(&(from, relationship)).into_iter().flatten() {
                undo.record_incoming(state, (*old, relationship));
            }
        }
        state.connect(from, relationship, to)
    }

    fn disconnect(
        &self,
        from: NodeId,
        relationship: Relationship,
        to: NodeId,
    ) -> Result<bool, StorageError> {
        let mut guard = self.guard.borrow_mut();
        let state: &mut GraphState = &mut guard;
        let mut undo = self.undo.borrow_mut();
        undo.record_outgoing(state, (from, relationship));
        undo.record_incoming(state, (to, relationship));
        Ok(state.disconnect(from, relationship, to))
    }

    fn related(
        &self,
        id: NodeId,
        relationship: Relationship,
        direction: Direction,
    ) -> Result<Vec<Node>, StorageError> {
        self.guard.borrow().related(id, relationship, direction)
    }

    fn count(&self, kind: EntityKind) -> Result<usize, StorageError> {
        Ok(self.guard.borrow().count(kind))
    }
}

impl GraphTransaction for InMemoryTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.undo.take();
        debug!("graph transaction committed");
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        let undo = self.undo.take();
        if !undo.is_empty() {
            undo.rollback(self.guard.get_mut());
            debug!("graph transaction rolled back");
        }
    }
}

#[derive(Debug, Default)]
struct BookmarkState {
    by_id: HashMap<BookmarkId, (u64, Bookmark)>,
    next_seq: u64,
}

impl BookmarkState {
    fn insert(&mut self, bookmark: Bookmark) -> Result<(), StorageError> {
        if self.by_id.contains_key(&bookmark.id) {
            return Err(StorageError::DuplicateKey(bookmark.id.to_string()));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(bookmark.id, (seq, bookmark));
        Ok(())
    }

    fn sorted<F>(&self, keep: F) -> Vec<Bookmark>
    where
        F: Fn(&Bookmark) -> bool,
    {
        let mut found: Vec<&(u64, Bookmark)> =
            self.by_id.values().filter(|(_, b)| keep(b)).collect();
        found.sort_by(|(sa, a), (sb, b)| a.created_at.cmp(&b.created_at).then(sa.cmp(sb)));
        found.into_iter().map(|(_, b)| b.clone()).collect()
    }
}

/// Thread-safe in-memory bookmark store.
#[derive(Debug, Default)]
pub struct InMemoryBookmarkStore {
    state: RwLock<BookmarkState>,
}

impl InMemoryBookmarkStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkStore for InMemoryBookmarkStore {
    fn insert(&self, bookmark: Bookmark) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("bookmark.insert"))?;
        state.insert(bookmark)
    }

    fn get_or_insert(&self, bookmark: Bookmark) -> Result<Bookmark, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("bookmark.get_or_insert"))?;
        let existing = state
            .by_id
            .values()
            .map(|(_, b)| b)
            .find(|b| b.owner == bookmark.owner && b.paper == bookmark.paper)
            .cloned();
        if let Some(existing) = existing {
            return Ok(existing);
        }
        state.insert(bookmark.clone())?;
        Ok(bookmark)
    }

    fn get(&self, id: BookmarkId) -> Result<Option<Bookmark>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("bookmark.get"))?;
        Ok(state.by_id.get(&id).map(|(_, b)| b.clone()))
    }

    fn delete(&self, id: BookmarkId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("bookmark.delete"))?;
        state
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::BookmarkNotFound(id))
    }

    fn find_by_owner(&self, owner: UserId) -> Result<Vec<Bookmark>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("bookmark.find_by_owner"))?;
        Ok(state.sorted(|b| b.owner == owner))
    }

    fn find_by_paper(&self, paper: NodeId) -> Result<Vec<Bookmark>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("bookmark.find_by_paper"))?;
        Ok(state.sorted(|b| b.paper == paper))
    }
}
