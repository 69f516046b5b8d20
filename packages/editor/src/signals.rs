//! # Notification Channels
//!
//! Observers subscribe either to one node or to the whole tree. While an
//! edit scope is open the channels are suspended: node notifications are
//! queued (one entry per node, first-notified order) and delivered in a
//! single flush when the outermost scope commits. Observers therefore never
//! run in the middle of a transaction.

use crate::NodeId;
use indexmap::IndexSet;
use std::collections::HashMap;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

pub(crate) struct Channel<T> {
    listeners: Vec<(Subscription, Listener<T>)>,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T> Channel<T> {
    fn add(&mut self, subscription: Subscription, listener: Listener<T>) {
        self.listeners.push((subscription, listener));
    }

    fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    fn emit(&mut self, value: &T) {
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }

    fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct Signals {
    suspended: usize,
    pending: IndexSet<NodeId>,
    nodes: HashMap<NodeId, Channel<NodeId>>,
    tree: Channel<u64>,
    next_subscription: u64,
}

impl Signals {
    fn next_subscription(&mut self) -> Subscription {
        self.next_subscription += 1;
        Subscription(self.next_subscription)
    }

    pub fn subscribe_node(&mut self, node: NodeId, listener: impl FnMut(&NodeId) + 'static) -> Subscription {
        let subscription = self.next_subscription();
        self.nodes
            .entry(node)
            .or_default()
            .add(subscription, Box::new(listener));
        subscription
    }

    pub fn subscribe_tree(&mut self, listener: impl FnMut(&u64) + 'static) -> Subscription {
        let subscription = self.next_subscription();
        self.tree.add(subscription, Box::new(listener));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        if self.tree.remove(subscription) {
            return true;
        }
        let mut found = false;
        self.nodes.retain(|_, channel| {
            found |= channel.remove(subscription);
            !channel.is_empty()
        });
        found
    }

    pub fn suspend(&mut self) {
        self.suspended += 1;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    pub fn notify(&mut self, node: NodeId) {
        if self.is_suspended() {
            self.pending.insert(node);
        } else if let Some(channel) = self.nodes.get_mut(&node) {
            channel.emit(&node);
        }
    }

    /// Lifts one suspension; the last one flushes the queue
    pub fn resume(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended > 0 {
            return;
        }
        for node in std::mem::take(&mut self.pending) {
            if let Some(channel) = self.nodes.get_mut(&node) {
                channel.emit(&node);
            }
        }
    }

    /// Lifts one suspension, dropping queued notifications
    pub fn resume_discarding(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended == 0 {
            self.pending.clear();
        }
    }

    pub fn notify_tree(&mut self, version: u64) {
        self.tree.emit(&version);
    }
}
