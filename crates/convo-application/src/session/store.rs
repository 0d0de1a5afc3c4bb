use convo_core::session::Session;

/// Identifies one `select` call. History fetched under a ticket is committed
/// only while the ticket is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub session_id: String,
    epoch: u64,
}

/// Identifies one session-list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// In-memory list of known sessions and which one is active.
///
/// Pure state: no I/O happens here. The session service drives it around
/// backend calls.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    selected_session_id: Option<String>,
    composing_new: bool,
    loaded: bool,
    /// Latest list fetch started; only its result is committed.
    load_epoch: u64,
    loading: bool,
    selection_epoch: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn selected_session_id(&self) -> Option<&str> {
        self.selected_session_id.as_deref()
    }

    pub fn is_selected(&self, session_id: &str) -> bool {
        self.selected_session_id.as_deref() == Some(session_id)
    }

    pub fn is_composing_new(&self) -> bool {
        self.composing_new
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    // ============================================================================
    // Session list loading
    // ============================================================================

    /// Decides whether a list fetch should start.
    ///
    /// Without `force`, nothing starts once the list has loaded or while a
    /// fetch is in flight. With `force`, a fetch always starts and supersedes
    /// any in-flight one.
    pub fn begin_load(&mut self, force: bool) -> Option<LoadTicket> {
        if !force && (self.loaded || self.loading) {
            return None;
        }
        self.load_epoch += 1;
        self.loading = true;
        Some(LoadTicket(self.load_epoch))
    }

    /// Commits a fetched list. Returns false if a newer fetch superseded it.
    pub fn finish_load(&mut self, ticket: LoadTicket, sessions: Vec<Session>) -> bool {
        if ticket.0 != self.load_epoch {
            return false;
        }
        self.sessions = sessions;
        self.loaded = true;
        self.loading = false;
        true
    }

    /// Ends a failed fetch. Returns false if a newer fetch superseded it.
    pub fn abort_load(&mut self, ticket: LoadTicket) -> bool {
        if ticket.0 != self.load_epoch {
            return false;
        }
        self.loading = false;
        true
    }

    // ============================================================================
    // Selection
    // ============================================================================

    /// Selects `session_id` and leaves compose mode.
    pub fn select(&mut self, session_id: &str) -> SelectionTicket {
        self.selection_epoch += 1;
        self.selected_session_id = Some(session_id.to_string());
        self.composing_new = false;
        SelectionTicket {
            session_id: session_id.to_string(),
            epoch: self.selection_epoch,
        }
    }

    /// Whether no selection change happened since `ticket` was issued.
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        ticket.epoch == self.selection_epoch && self.is_selected(&ticket.session_id)
    }

    /// Clears the selection and enters compose mode.
    pub fn start_composing(&mut self) {
        self.selection_epoch += 1;
        self.selected_session_id = None;
        self.composing_new = true;
    }

    /// Selects a freshly created session.
    pub fn adopt_created(&mut self, session: &Session) {
        self.select(&session.id);
    }

    // ============================================================================
    // Local mutations mirroring backend changes
    // ============================================================================

    /// Renames a known session. Returns false if it is not in the list.
    pub fn rename(&mut self, session_id: &str, title: &str) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(session) => {
                session.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes a session. Returns true if it was the selected one, in which
    /// case the selection is cleared.
    pub fn remove(&mut self, session_id: &str) -> bool {
        self.sessions.retain(|s| s.id != session_id);
        if self.is_selected(session_id) {
            self.selection_epoch += 1;
            self.selected_session_id = None;
            true
        } else {
            false
        }
    }
}
