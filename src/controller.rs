//! Runs the effects the session reducer asks for.
//!
//! Remote calls execute on a short-lived worker thread each; their outcome
//! comes back as a [`SessionEvent`] over a channel and is applied on the
//! caller's thread by [`SessionController::poll`] or
//! [`SessionController::wait`]. Session state never leaves this thread.

use std::{
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread,
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::document::{DocumentFile, validate_upload};
use crate::error::{GatewayError, UploadError};
use crate::gateway::DocumentGateway;
use crate::session::{Effect, Phase, Session, SessionEvent, SessionState};

/// Something the presentation layer should tell the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Blocking message; the session has already recovered.
    Alert(String),
    Saved { path: PathBuf },
}

pub struct SessionController<G: DocumentGateway> {
    session: Session,
    gateway: Arc<G>,
    output_dir: PathBuf,
    completions_tx: Sender<SessionEvent>,
    completions_rx: Receiver<SessionEvent>,
    notices: VecDeque<Notice>,
}

impl<G: DocumentGateway> SessionController<G> {
    pub fn new(gateway: G, output_dir: impl Into<PathBuf>) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        Self {
            session: Session::new(),
            gateway: Arc::new(gateway),
            output_dir: output_dir.into(),
            completions_tx,
            completions_rx,
            notices: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Validate and read `path`, then upload it. Ignored while a document
    /// is already loading or open.
    pub fn open_path(&mut self, path: &Path) -> Result<(), UploadError> {
        if self.phase() != Phase::Idle {
            debug!(path = %path.display(), "upload ignored, session busy");
            return Ok(());
        }
        let document = DocumentFile::open(path)?;
        self.submit_file(document)
    }

    pub fn submit_file(&mut self, document: DocumentFile) -> Result<(), UploadError> {
        validate_upload(document.name(), document.content_type())?;
        self.dispatch(SessionEvent::FileSubmitted(document));
        Ok(())
    }

    pub fn edit_text(&mut self, text: String) {
        self.dispatch(SessionEvent::TextChanged(text));
    }

    pub fn request_download(&mut self) {
        self.dispatch(SessionEvent::DownloadRequested);
    }

    pub fn reset(&mut self) {
        self.dispatch(SessionEvent::ResetRequested);
    }

    /// Apply every completion that has already arrived.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.completions_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Block until one completion arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.completions_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(event);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.apply(event) {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Extract { request, document } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_request(
                    move || SessionEvent::ExtractionFinished {
                        request,
                        result: gateway.extract_text(&document),
                    },
                    move |err| SessionEvent::ExtractionFinished {
                        request,
                        result: Err(err),
                    },
                );
            }
            Effect::ApplyEdits {
                request,
                document,
                text_map,
            } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_request(
                    move || SessionEvent::ApplyFinished {
                        request,
                        result: gateway.apply_edits(&document, &text_map),
                    },
                    move |err| SessionEvent::ApplyFinished {
                        request,
                        result: Err(err),
                    },
                );
            }
            Effect::Save { file_name, bytes } => match self.save(&file_name, &bytes) {
                Ok(path) => {
                    info!(path = %path.display(), size = bytes.len(), "saved edited document");
                    self.notices.push_back(Notice::Saved { path });
                }
                Err(err) => {
                    warn!(file = %file_name, error = %err, "saving edited document failed");
                    self.notices
                        .push_back(Notice::Alert(format!("Failed to save {file_name}: {err}")));
                }
            },
            Effect::Alert(message) => self.notices.push_back(Notice::Alert(message)),
        }
    }

    fn spawn_request<F, E>(&mut self, job: F, on_spawn_error: E)
    where
        F: FnOnce() -> SessionEvent + Send + 'static,
        E: FnOnce(GatewayError) -> SessionEvent,
    {
        let tx = self.completions_tx.clone();
        let spawned = thread::Builder::new()
            .name("docpatch-request".to_string())
            .spawn(move || {
                if tx.send(job()).is_err() {
                    debug!("controller dropped before request completed");
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "could not spawn request worker");
            let event = on_spawn_error(GatewayError::Worker(err));
            self.dispatch(event);
        }
    }

    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::text_map::TextMap;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct FakeGateway {
        extract_result: Mutex<Option<Result<String, GatewayError>>>,
        apply_result: Mutex<Option<Result<Vec<u8>, GatewayError>>>,
        extract_calls: Mutex<Vec<String>>,
        apply_calls: Mutex<Vec<TextMap>>,
    }

    impl FakeGateway {
        fn extracting(text: &str) -> Self {
            let gateway = Self::default();
            *gateway.extract_result.lock().unwrap() = Some(Ok(text.to_string()));
            gateway
        }

        fn with_apply(self, result: Result<Vec<u8>, GatewayError>) -> Self {
            *self.apply_result.lock().unwrap() = Some(result);
            self
        }
    }

    impl DocumentGateway for FakeGateway {
        fn extract_text(&self, document: &DocumentFile) -> Result<String, GatewayError> {
            self.extract_calls
                .lock()
                .unwrap()
                .push(document.name().to_string());
            self.extract_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(GatewayError::MissingBaseUrl))
        }

        fn apply_edits(
            &self,
            _document: &DocumentFile,
            text_map: &TextMap,
        ) -> Result<Vec<u8>, GatewayError> {
            self.apply_calls.lock().unwrap().push(text_map.clone());
            self.apply_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(GatewayError::MissingBaseUrl))
        }
    }

    fn docx(name: &str) -> DocumentFile {
        DocumentFile::new(name, "", vec![0x50u8, 0x4b])
    }

    #[test]
    fn upload_then_edit_then_download_saves_copy() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::extracting("Hello world\n\nGoodbye").with_apply(Ok(b"patched".to_vec()));
        let mut controller = SessionController::new(gateway, dir.path());

        controller.submit_file(docx("report.docx")).unwrap();
        assert_eq!(controller.phase(), Phase::Loading);
        assert!(controller.wait(WAIT));
        assert_eq!(controller.phase(), Phase::Editing);

        controller.edit_text("Hello there\n\nGoodbye".to_string());
        controller.request_download();
        assert_eq!(controller.phase(), Phase::Downloading);
        assert!(controller.wait(WAIT));
        assert_eq!(controller.phase(), Phase::Editing);

        let saved = dir.path().join("report_edited.docx");
        assert_eq!(controller.drain_notices(), vec![Notice::Saved { path: saved.clone() }]);
        assert_eq!(fs::read(saved).unwrap(), b"patched");

        let calls = controller.gateway.apply_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("Hello world"), Some("Hello there"));
    }

    #[test]
    fn invalid_file_is_rejected_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SessionController::new(FakeGateway::default(), dir.path());

        let err = controller
            .submit_file(DocumentFile::new("report.pdf", "application/pdf", vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(!controller.wait(Duration::from_millis(50)));
        assert!(controller.gateway.extract_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn extraction_failure_alerts_and_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::default();
        *gateway.extract_result.lock().unwrap() = Some(Err(GatewayError::Status {
            endpoint: "extract-text",
            status: 500,
            detail: String::new(),
        }));
        let mut controller = SessionController::new(gateway, dir.path());

        controller.submit_file(docx("report.docx")).unwrap();
        assert!(controller.wait(WAIT));

        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.state().document().is_none());
        assert!(matches!(controller.drain_notices().as_slice(), [Notice::Alert(_)]));
    }

    #[test]
    fn download_failure_keeps_text_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::extracting("draft").with_apply(Err(GatewayError::Status {
            endpoint: "edit-docx",
            status: 500,
            detail: "broken".to_string(),
        }));
        let mut controller = SessionController::new(gateway, dir.path());
        controller.submit_file(docx("report.docx")).unwrap();
        assert!(controller.wait(WAIT));

        controller.edit_text("final".to_string());
        controller.request_download();
        assert!(controller.wait(WAIT));

        assert_eq!(controller.phase(), Phase::Editing);
        assert_eq!(controller.state().loaded().unwrap().edited_text(), "final");
        assert!(matches!(controller.drain_notices().as_slice(), [Notice::Alert(msg)] if msg.contains("broken")));
        assert!(!dir.path().join("report_edited.docx").exists());
    }

    #[test]
    fn reset_while_loading_discards_late_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SessionController::new(FakeGateway::extracting("late"), dir.path());
        controller.submit_file(docx("report.docx")).unwrap();
        controller.reset();
        assert_eq!(controller.phase(), Phase::Idle);

        assert!(controller.wait(WAIT));
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.drain_notices().is_empty());
    }

    #[test]
    fn open_path_validates_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SessionController::new(FakeGateway::default(), dir.path());
        let err = controller
            .open_path(&dir.path().join("missing.pdf"))
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));

        let err = controller
            .open_path(&dir.path().join("missing.docx"))
            .unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn save_failure_is_reported_as_alert() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let gateway = FakeGateway::extracting("x").with_apply(Ok(vec![1]));
        let mut controller = SessionController::new(gateway, &blocker);

        controller.submit_file(docx("report.docx")).unwrap();
        assert!(controller.wait(WAIT));
        controller.request_download();
        assert!(controller.wait(WAIT));

        assert_eq!(controller.phase(), Phase::Editing);
        assert!(matches!(controller.drain_notices().as_slice(), [Notice::Alert(msg)] if msg.contains("report_edited.docx")));
    }
}
