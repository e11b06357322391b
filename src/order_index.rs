use crate::types::{Order, OrderId};
use slab::Slab;
use std::collections::HashMap;

/// Stable key of an order node inside the `OrderIndex` arena.
///
/// A handle stays valid until its order is removed from the index. Price level
/// queues hold handles, never a second copy of the order.
pub(crate) type Handle = usize;

/// An order record plus the intrusive links of its price level queue.
#[derive(Debug, Clone)]
pub(crate) struct OrderNode {
    pub(crate) order: Order,
    pub(crate) prev: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

/// The single owning store of live orders, keyed by order id.
///
/// Records live in a slab arena so their handles are stable across inserts
/// and removals of other orders; a hash map resolves ids to handles.
#[derive(Debug, Default)]
pub(crate) struct OrderIndex {
    nodes: Slab<OrderNode>,
    handles: HashMap<OrderId, Handle>,
}

impl OrderIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        OrderIndex {
            nodes: Slab::with_capacity(capacity),
            handles: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn contains(&self, order_id: OrderId) -> bool {
        self.handles.contains_key(&order_id)
    }

    pub(crate) fn handle(&self, order_id: OrderId) -> Option<Handle> {
        self.handles.get(&order_id).copied()
    }

    pub(crate) fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.handle(order_id)
            .and_then(|handle| self.nodes.get(handle))
            .map(|node| &node.order)
    }

    pub(crate) fn node(&self, handle: Handle) -> Option<&OrderNode> {
        self.nodes.get(handle)
    }

    pub(crate) fn node_mut(&mut self, handle: Handle) -> Option<&mut OrderNode> {
        self.nodes.get_mut(handle)
    }

    /// Stores a new, unlinked order and returns its handle.
    ///
    /// The caller has already checked that the id is not live.
    pub(crate) fn insert(&mut self, order: Order) -> Handle {
        debug_assert!(!self.handles.contains_key(&order.id));
        let order_id = order.id;
        let handle = self.nodes.insert(OrderNode {
            order,
            prev: None,
            next: None,
        });
        self.handles.insert(order_id, handle);
        handle
    }

    /// Drops the record of `order_id`. Its handle must already be unlinked
    /// from its price level queue.
    pub(crate) fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let handle = self.handles.remove(&order_id)?;
        self.nodes.try_remove(handle).map(|node| node.order)
    }

    pub(crate) fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.nodes.iter().map(|(_, node)| &node.order)
    }
}
