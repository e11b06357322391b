use crate::order_index::{Handle, OrderIndex};
use crate::types::Order;
use rust_decimal::Decimal;

/// All live orders resting at one price on one side.
///
/// The queue is intrusive: the level only keeps the head and tail handles and
/// each order node in the `OrderIndex` carries its `prev`/`next` links. That
/// makes appends and targeted removals O(1) while the relative order of the
/// remaining orders is never disturbed.
#[derive(Debug, Clone)]
pub(crate) struct PriceLevel {
    price: Decimal,
    /// Always the sum of the queued quantities
    aggregate_size: u64,
    /// Always the queue length
    order_count: usize,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl PriceLevel {
    pub(crate) fn new(price: Decimal) -> Self {
        PriceLevel {
            price,
            aggregate_size: 0,
            order_count: 0,
            head: None,
            tail: None,
        }
    }

    pub(crate) fn price(&self) -> Decimal {
        self.price
    }

    pub(crate) fn aggregate_size(&self) -> u64 {
        self.aggregate_size
    }

    pub(crate) fn order_count(&self) -> usize {
        self.order_count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Appends an unlinked order at the tail of the queue.
    ///
    /// Returns `None` and leaves the level untouched if the handle is not in
    /// `index` or the aggregate size would overflow.
    pub(crate) fn push_back(&mut self, handle: Handle, index: &mut OrderIndex) -> Option<()> {
        let quantity = index.node(handle)?.order.quantity;
        let aggregate_size = self.aggregate_size.checked_add(quantity)?;

        let previous_tail = self.tail;
        if let Some(node) = index.node_mut(handle) {
            node.prev = previous_tail;
            node.next = None;
        }
        match previous_tail.and_then(|tail| index.node_mut(tail)) {
            Some(tail_node) => tail_node.next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);

        self.aggregate_size = aggregate_size;
        self.order_count += 1;
        Some(())
    }

    /// Unlinks an order from anywhere in the queue and returns the quantity
    /// it contributed. The order's neighbours are joined, so the rest of the
    /// queue keeps its order.
    ///
    /// Returns `None` and leaves the level untouched if the handle is not
    /// queued here.
    pub(crate) fn unlink(&mut self, handle: Handle, index: &mut OrderIndex) -> Option<u64> {
        let quantity = index.node(handle)?.order.quantity;
        let aggregate_size = self.aggregate_size.checked_sub(quantity)?;
        let order_count = self.order_count.checked_sub(1)?;

        let (prev, next) = match index.node_mut(handle) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return None,
        };
        match prev.and_then(|prev| index.node_mut(prev)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|next| index.node_mut(next)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        self.aggregate_size = aggregate_size;
        self.order_count = order_count;
        Some(quantity)
    }

    /// Aggregate size the level would have if the order currently holding
    /// `old_quantity` held `new_quantity` instead, or `None` on overflow.
    pub(crate) fn resized_aggregate(&self, old_quantity: u64, new_quantity: u64) -> Option<u64> {
        self.aggregate_size
            .checked_sub(old_quantity)?
            .checked_add(new_quantity)
    }

    /// Sets the remaining quantity of a queued order in place and moves the
    /// aggregate by the same delta. Returns the previous quantity.
    ///
    /// Returns `None` and leaves both the level and the order untouched if
    /// the handle is missing or the aggregate size would overflow.
    pub(crate) fn resize(
        &mut self,
        handle: Handle,
        new_quantity: u64,
        index: &mut OrderIndex,
    ) -> Option<u64> {
        let old_quantity = index.node(handle)?.order.quantity;
        let aggregate_size = self.resized_aggregate(old_quantity, new_quantity)?;

        index.node_mut(handle)?.order.quantity = new_quantity;
        self.aggregate_size = aggregate_size;
        Some(old_quantity)
    }

    /// Walks the queue front (oldest) to back (newest).
    pub(crate) fn iter<'a>(&self, index: &'a OrderIndex) -> QueueIter<'a> {
        QueueIter {
            index,
            cursor: self.head,
            remaining: self.order_count,
        }
    }
}

pub(crate) struct QueueIter<'a> {
    index: &'a OrderIndex,
    cursor: Option<Handle>,
    // Stops the walk after order_count nodes
    remaining: usize,
}

impl<'a> Iterator for QueueIter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.index.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.order)
    }
}
