//! Out-of-band comment delivery.

use std::fmt;

/// A comment found in a table stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    /// Row the comment belongs to, or [`Comment::END_OF_STREAM`].
    pub row: usize,
    /// Column within the row; `None` for the whole row or an unknown position.
    pub column: Option<usize>,
}

impl Comment {
    /// Row index of comments flushed when a reader closes.
    pub const END_OF_STREAM: usize = usize::MAX;

    pub fn new(text: impl Into<String>, row: usize, column: Option<usize>) -> Self {
        Self {
            text: text.into(),
            row,
            column,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.row == Self::END_OF_STREAM
    }
}

/// Callback invoked for every comment a reader encounters.
pub type CommentCallback = Box<dyn FnMut(&Comment)>;

/// Handle returned on registration, used to unregister a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Notifies registered callbacks in registration order.
#[derive(Default)]
pub struct CommentDispatcher {
    next_id: u64,
    callbacks: Vec<(CallbackId, CommentCallback)>,
}

impl CommentDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: CommentCallback) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        self.callbacks.len() != before
    }

    pub fn notify(&mut self, comment: &Comment) {
        for (_, callback) in &mut self.callbacks {
            callback(comment);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for CommentDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentDispatcher")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
