use convo_core::session::{ChatMessage, ChatMode, HistoryRecord, MessageId};

/// Ids of the two messages appended optimistically for one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingExchange {
    pub user_message_id: MessageId,
    pub placeholder_id: MessageId,
}

/// What happened to a reply handed to [`MessageReconciler::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The placeholder was replaced in place.
    Replaced(ChatMessage),
    /// The placeholder was gone; the reply was appended at the end.
    Appended(ChatMessage),
    /// The placeholder was gone and appending was not allowed.
    Dropped,
}

impl Resolution {
    pub fn into_message(self) -> Option<ChatMessage> {
        match self {
            Resolution::Replaced(m) | Resolution::Appended(m) => Some(m),
            Resolution::Dropped => None,
        }
    }
}

/// The selected session's ordered message list, with optimistic insertion.
///
/// A send appends the user message and a loading placeholder at once; the
/// placeholder is later replaced or removed by its id.
#[derive(Debug, Default, Clone)]
pub struct MessageReconciler {
    messages: Vec<ChatMessage>,
}

impl MessageReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replaces the list with normalized history records.
    pub fn load_history(&mut self, records: Vec<HistoryRecord>) {
        self.messages = records
            .into_iter()
            .flat_map(HistoryRecord::into_messages)
            .collect();
    }

    /// Appends the user message and its loading bot placeholder.
    pub fn begin(&mut self, text: &str, mode: ChatMode) -> PendingExchange {
        let user_message_id = self.push_user(text, mode);
        self.await_reply(user_message_id, mode)
    }

    /// Appends a user message on its own. Used when the send may fail before
    /// a reply is requested.
    pub fn push_user(&mut self, text: &str, mode: ChatMode) -> MessageId {
        let user = ChatMessage::user(text, mode);
        let id = user.id;
        self.messages.push(user);
        id
    }

    /// Appends the loading placeholder answering `user_message_id`.
    pub fn await_reply(&mut self, user_message_id: MessageId, mode: ChatMode) -> PendingExchange {
        let placeholder = ChatMessage::placeholder(mode);
        let pending = PendingExchange {
            user_message_id,
            placeholder_id: placeholder.id,
        };
        self.messages.push(placeholder);
        pending
    }

    /// Swaps the placeholder for `reply`, which takes over the placeholder's id.
    ///
    /// When the placeholder is no longer in the list, `reply` is appended if
    /// `append_if_missing` is set and dropped otherwise.
    pub fn resolve(
        &mut self,
        pending: &PendingExchange,
        mut reply: ChatMessage,
        append_if_missing: bool,
    ) -> Resolution {
        reply.is_loading = false;
        match self.position(pending.placeholder_id) {
            Some(index) => {
                reply.id = pending.placeholder_id;
                self.messages[index] = reply.clone();
                Resolution::Replaced(reply)
            }
            None if append_if_missing => {
                self.messages.push(reply.clone());
                Resolution::Appended(reply)
            }
            None => Resolution::Dropped,
        }
    }

    /// Removes the placeholder of a failed send. Returns whether it was found.
    pub fn fail(&mut self, pending: &PendingExchange) -> bool {
        match self.position(pending.placeholder_id) {
            Some(index) => {
                self.messages.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of placeholders still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_loading).count()
    }

    fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().rposition(|m| m.id == id)
    }
}
