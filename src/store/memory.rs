// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::{ResultStore, StoredHandle};
use crate::dag::NodeId;

#[derive(Debug)]
struct Inner<R> {
    results: HashMap<String, R>,
    persist_order: Vec<NodeId>,
}

/// In-memory [`ResultStore`]. Clones share the same storage.
#[derive(Debug)]
pub struct MemoryStore<R> {
    inner: Arc<Mutex<Inner<R>>>,
}

impl<R> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                results: HashMap::new(),
                persist_order: Vec::new(),
            })),
        }
    }
}

impl<R: Clone> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in the order their results were persisted.
    pub fn persist_order(&self) -> Vec<NodeId> {
        self.lock()
            .map(|inner| inner.persist_order.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.lock()
            .map(|inner| inner.results.contains_key(&location(node)))
            .unwrap_or(false)
    }

    pub fn get(&self, node: NodeId) -> Option<R> {
        self.lock()
            .ok()
            .and_then(|inner| inner.results.get(&location(node)).cloned())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.results.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<R>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

fn location(node: NodeId) -> String {
    format!("memory/{}", node.index())
}

impl<R> ResultStore<R> for MemoryStore<R>
where
    R: Clone + Send + 'static,
{
    fn persist(&self, node: NodeId, result: &R) -> Result<StoredHandle> {
        let location = location(node);
        let mut inner = self.lock()?;
        inner.results.insert(location.clone(), result.clone());
        inner.persist_order.push(node);
        Ok(StoredHandle { node, location })
    }

    fn load(&self, handle: &StoredHandle) -> Result<R> {
        self.lock()?
            .results
            .get(&handle.location)
            .cloned()
            .ok_or_else(|| anyhow!("no result stored for {handle}"))
    }
}
