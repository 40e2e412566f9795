//! Explicit change notification for book records.
//!
//! Observers register for the kinds of change they care about and receive
//! [`BookUpdate`]s on an unbounded channel. Every change flows through
//! [`BookTab::update_book`](crate::BookTab::update_book), which is the only
//! caller of [`ChangeNotifier::notify`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use flow_model::{BookChanges, BookRecord, BookUpdate, ChangeKind};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

struct Subscriber {
    kinds: Vec<ChangeKind>,
    sender: UnboundedSender<BookUpdate>,
}

/// Fan-out of book changes to interested subscribers.
///
/// Cloning shares the subscriber list.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    subscribers: Rc<RefCell<Vec<Subscriber>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive updates touching any of `kinds`.
    ///
    /// Dropping the receiver unsubscribes on the next notification.
    pub fn subscribe(&self, kinds: &[ChangeKind]) -> UnboundedReceiver<BookUpdate> {
        let (sender, receiver) = unbounded_channel();
        self.subscribers.borrow_mut().push(Subscriber {
            kinds: kinds.to_vec(),
            sender,
        });
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Tell subscribers that `changes` were merged into `record`.
    pub fn notify(&self, record: &BookRecord, changes: &BookChanges) {
        let changed = changes.kinds();
        if changed.is_empty() {
            return;
        }

        self.subscribers.borrow_mut().retain(|subscriber| {
            let kinds: Vec<ChangeKind> = changed
                .iter()
                .copied()
                .filter(|kind| subscriber.kinds.contains(kind))
                .collect();
            if kinds.is_empty() {
                return !subscriber.sender.is_closed();
            }
            let update = BookUpdate {
                book_id: record.id.clone(),
                kinds,
                record: record.clone(),
            };
            subscriber.sender.send(update).is_ok()
        });
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
