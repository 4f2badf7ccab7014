//! The edit session as an explicit state machine.
//!
//! [`Session::apply`] is a pure reducer: it consumes one [`SessionEvent`],
//! moves to the next [`SessionState`] and returns the [`Effect`]s the caller
//! must carry out (remote calls, saving, alerts). Nothing here performs I/O.
//!
//! ```text
//! Idle --FileSubmitted--> Loading --ok--> Editing <--> Downloading
//!   ^                        |err            |  ^ TextChanged |
//!   +------------------------+               +--+------------+
//!   ^  ResetRequested (from any state)
//! ```

use std::mem;

use tracing::{debug, info, warn};

use crate::document::{DocumentFile, edited_file_name};
use crate::error::GatewayError;
use crate::text_map::{TextMap, build_text_map};

/// Identifies one remote call. A completion is only honoured while the
/// session still waits on the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedDocument {
    document: DocumentFile,
    original_text: String,
    edited_text: String,
}

impl LoadedDocument {
    fn new(document: DocumentFile, text: String) -> Self {
        Self {
            document,
            original_text: text.clone(),
            edited_text: text,
        }
    }

    pub fn document(&self) -> &DocumentFile {
        &self.document
    }

    pub fn file_name(&self) -> &str {
        self.document.name()
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn edited_text(&self) -> &str {
        &self.edited_text
    }

    pub fn text_map(&self) -> TextMap {
        build_text_map(&self.original_text, &self.edited_text)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading {
        document: DocumentFile,
        request: RequestId,
    },
    Editing(LoadedDocument),
    /// Editing continues while the patched document is being generated.
    Downloading {
        loaded: LoadedDocument,
        request: RequestId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Editing,
    Downloading,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Loading { .. } => Phase::Loading,
            SessionState::Editing(_) => Phase::Editing,
            SessionState::Downloading { .. } => Phase::Downloading,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedDocument> {
        match self {
            SessionState::Editing(loaded) | SessionState::Downloading { loaded, .. } => {
                Some(loaded)
            }
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&DocumentFile> {
        match self {
            SessionState::Idle => None,
            SessionState::Loading { document, .. } => Some(document),
            SessionState::Editing(loaded) | SessionState::Downloading { loaded, .. } => {
                Some(&loaded.document)
            }
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.document().map(DocumentFile::name)
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    pub fn is_downloading(&self) -> bool {
        self.phase() == Phase::Downloading
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    /// A file that already passed upload validation.
    FileSubmitted(DocumentFile),
    ExtractionFinished {
        request: RequestId,
        result: Result<String, GatewayError>,
    },
    TextChanged(String),
    DownloadRequested,
    ApplyFinished {
        request: RequestId,
        result: Result<Vec<u8>, GatewayError>,
    },
    ResetRequested,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Extract {
        request: RequestId,
        document: DocumentFile,
    },
    ApplyEdits {
        request: RequestId,
        document: DocumentFile,
        text_map: TextMap,
    },
    Save {
        file_name: String,
        bytes: Vec<u8>,
    },
    Alert(String),
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    next_request: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        let state = mem::take(&mut self.state);
        let before = state.phase();
        let (next, effects) = self.transition(state, event);
        if next.phase() != before {
            debug!(from = ?before, to = ?next.phase(), "session transition");
        }
        self.state = next;
        effects
    }

    fn allocate_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn transition(
        &mut self,
        state: SessionState,
        event: SessionEvent,
    ) -> (SessionState, Vec<Effect>) {
        match (state, event) {
            (_, SessionEvent::ResetRequested) => (SessionState::Idle, Vec::new()),

            (SessionState::Idle, SessionEvent::FileSubmitted(document)) => {
                let request = self.allocate_request();
                info!(file = document.name(), size = document.len(), "loading document");
                let effects = vec![Effect::Extract {
                    request,
                    document: document.clone(),
                }];
                (SessionState::Loading { document, request }, effects)
            }

            (
                SessionState::Loading { document, request },
                SessionEvent::ExtractionFinished {
                    request: finished,
                    result,
                },
            ) if finished == request => match result {
                Ok(text) => (
                    SessionState::Editing(LoadedDocument::new(document, text)),
                    Vec::new(),
                ),
                Err(err) => {
                    warn!(file = document.name(), error = %err, "text extraction failed");
                    (
                        SessionState::Idle,
                        vec![Effect::Alert(format!("Failed to load document text: {err}"))],
                    )
                }
            },

            (SessionState::Editing(mut loaded), SessionEvent::TextChanged(text)) => {
                loaded.edited_text = text;
                (SessionState::Editing(loaded), Vec::new())
            }
            (SessionState::Downloading { mut loaded, request }, SessionEvent::TextChanged(text)) => {
                loaded.edited_text = text;
                (SessionState::Downloading { loaded, request }, Vec::new())
            }

            (SessionState::Editing(loaded), SessionEvent::DownloadRequested) => {
                let request = self.allocate_request();
                let text_map = loaded.text_map();
                info!(
                    file = loaded.file_name(),
                    replacements = text_map.len(),
                    "requesting patched document"
                );
                let effects = vec![Effect::ApplyEdits {
                    request,
                    document: loaded.document.clone(),
                    text_map,
                }];
                (SessionState::Downloading { loaded, request }, effects)
            }

            (
                SessionState::Downloading { loaded, request },
                SessionEvent::ApplyFinished {
                    request: finished,
                    result,
                },
            ) if finished == request => {
                let effect = match result {
                    Ok(bytes) => Effect::Save {
                        file_name: edited_file_name(loaded.file_name()),
                        bytes,
                    },
                    Err(err) => {
                        warn!(file = loaded.file_name(), error = %err, "applying edits failed");
                        Effect::Alert(format!("Failed to generate document: {err}"))
                    }
                };
                (SessionState::Editing(loaded), vec![effect])
            }

            (
                state,
                SessionEvent::ExtractionFinished { request, .. }
                | SessionEvent::ApplyFinished { request, .. },
            ) => {
                debug!(request = request.value(), phase = ?state.phase(), "ignoring stale completion");
                (state, Vec::new())
            }

            (state, event) => {
                debug!(phase = ?state.phase(), ?event, "event ignored in current phase");
                (state, Vec::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
