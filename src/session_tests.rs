use super::*;

fn sample_document(name: &str) -> DocumentFile {
    DocumentFile::new(name, "", vec![0x50u8, 0x4b, 0x03, 0x04])
}

fn extract_request(effects: &[Effect]) -> RequestId {
    match effects {
        [Effect::Extract { request, .. }] => *request,
        other => panic!("expected a single extract effect, got {other:?}"),
    }
}

fn apply_request(effects: &[Effect]) -> (RequestId, TextMap) {
    match effects {
        [Effect::ApplyEdits {
            request, text_map, ..
        }] => (*request, text_map.clone()),
        other => panic!("expected a single apply effect, got {other:?}"),
    }
}

fn editing_session(name: &str, text: &str) -> Session {
    let mut session = Session::new();
    let effects = session.apply(SessionEvent::FileSubmitted(sample_document(name)));
    let request = extract_request(&effects);
    let effects = session.apply(SessionEvent::ExtractionFinished {
        request,
        result: Ok(text.to_string()),
    });
    assert!(effects.is_empty());
    assert_eq!(session.phase(), Phase::Editing);
    session
}

#[test]
fn new_session_is_idle() {
    let session = Session::new();
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.state().document().is_none());
    assert!(session.state().loaded().is_none());
}

#[test]
fn submitted_file_starts_extraction() {
    let mut session = Session::new();
    let document = sample_document("report.docx");
    let effects = session.apply(SessionEvent::FileSubmitted(document.clone()));

    assert_eq!(session.phase(), Phase::Loading);
    assert!(session.state().is_loading());
    assert!(!session.state().is_downloading());
    assert_eq!(session.state().file_name(), Some("report.docx"));
    match effects.as_slice() {
        [Effect::Extract { document: sent, .. }] => assert_eq!(sent, &document),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn successful_extraction_enters_editing_with_both_texts() {
    let session = editing_session("report.docx", "Hello world\n\nGoodbye");
    let loaded = session.state().loaded().expect("loaded document");
    assert_eq!(loaded.file_name(), "report.docx");
    assert_eq!(loaded.original_text(), "Hello world\n\nGoodbye");
    assert_eq!(loaded.edited_text(), "Hello world\n\nGoodbye");
}

#[test]
fn failed_extraction_returns_to_idle_with_alert() {
    let mut session = Session::new();
    let request = extract_request(
        &session.apply(SessionEvent::FileSubmitted(sample_document("report.docx"))),
    );
    let effects = session.apply(SessionEvent::ExtractionFinished {
        request,
        result: Err(GatewayError::Status {
            endpoint: "extract-text",
            status: 500,
            detail: "boom".to_string(),
        }),
    });

    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.state().document().is_none());
    match effects.as_slice() {
        [Effect::Alert(message)] => assert!(message.starts_with("Failed to load document text")),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn missing_configuration_returns_to_idle_with_alert() {
    let mut session = Session::new();
    let request = extract_request(
        &session.apply(SessionEvent::FileSubmitted(sample_document("report.docx"))),
    );
    let effects = session.apply(SessionEvent::ExtractionFinished {
        request,
        result: Err(GatewayError::MissingBaseUrl),
    });
    assert_eq!(session.phase(), Phase::Idle);
    assert!(matches!(effects.as_slice(), [Effect::Alert(_)]));
}

#[test]
fn second_upload_while_loading_is_ignored() {
    let mut session = Session::new();
    session.apply(SessionEvent::FileSubmitted(sample_document("first.docx")));
    let effects = session.apply(SessionEvent::FileSubmitted(sample_document("second.docx")));
    assert!(effects.is_empty());
    assert_eq!(session.state().file_name(), Some("first.docx"));
}

#[test]
fn text_changes_only_touch_edited_text() {
    let mut session = editing_session("report.docx", "Hello world\n\nGoodbye");
    let document_before = session.state().document().cloned();

    session.apply(SessionEvent::TextChanged("Hello there\n\nGoodbye".to_string()));

    let loaded = session.state().loaded().unwrap();
    assert_eq!(loaded.original_text(), "Hello world\n\nGoodbye");
    assert_eq!(loaded.edited_text(), "Hello there\n\nGoodbye");
    assert_eq!(session.state().document().cloned(), document_before);
}

#[test]
fn text_changes_outside_editing_are_ignored() {
    let mut session = Session::new();
    assert!(session.apply(SessionEvent::TextChanged("x".into())).is_empty());
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn download_sends_only_changed_paragraphs() {
    let mut session = editing_session("report.docx", "Hello world\n\nGoodbye");
    session.apply(SessionEvent::TextChanged("Hello there\n\nGoodbye".to_string()));

    let effects = session.apply(SessionEvent::DownloadRequested);
    assert_eq!(session.phase(), Phase::Downloading);
    let (_, text_map) = apply_request(&effects);
    assert_eq!(text_map.len(), 1);
    assert_eq!(text_map.get("Hello world"), Some("Hello there"));
}

#[test]
fn unchanged_download_still_issues_request_with_empty_map() {
    let mut session = editing_session("report.docx", "Hello world\n\nGoodbye");
    let (_, text_map) = apply_request(&session.apply(SessionEvent::DownloadRequested));
    assert!(text_map.is_empty());
}

#[test]
fn successful_download_saves_edited_copy_and_returns_to_editing() {
    let mut session = editing_session("report.docx", "a");
    let (request, _) = apply_request(&session.apply(SessionEvent::DownloadRequested));

    let effects = session.apply(SessionEvent::ApplyFinished {
        request,
        result: Ok(vec![1, 2, 3]),
    });

    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(
        effects,
        vec![Effect::Save {
            file_name: "report_edited.docx".to_string(),
            bytes: vec![1, 2, 3],
        }]
    );
}

#[test]
fn failed_download_keeps_edits() {
    let mut session = editing_session("report.docx", "original");
    session.apply(SessionEvent::TextChanged("typed by hand".to_string()));
    let (request, _) = apply_request(&session.apply(SessionEvent::DownloadRequested));

    let effects = session.apply(SessionEvent::ApplyFinished {
        request,
        result: Err(GatewayError::Status {
            endpoint: "edit-docx",
            status: 422,
            detail: "bad map".to_string(),
        }),
    });

    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.state().loaded().unwrap().edited_text(), "typed by hand");
    match effects.as_slice() {
        [Effect::Alert(message)] => assert!(message.contains("bad map")),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn editing_continues_while_downloading() {
    let mut session = editing_session("report.docx", "one");
    let (request, _) = apply_request(&session.apply(SessionEvent::DownloadRequested));

    session.apply(SessionEvent::TextChanged("one more".to_string()));
    assert_eq!(session.phase(), Phase::Downloading);

    session.apply(SessionEvent::ApplyFinished {
        request,
        result: Ok(Vec::new()),
    });
    assert_eq!(session.state().loaded().unwrap().edited_text(), "one more");
}

#[test]
fn second_download_while_busy_is_ignored() {
    let mut session = editing_session("report.docx", "one");
    apply_request(&session.apply(SessionEvent::DownloadRequested));
    assert!(session.apply(SessionEvent::DownloadRequested).is_empty());
    assert_eq!(session.phase(), Phase::Downloading);
}

#[test]
fn reset_discards_everything_from_any_phase() {
    let mut session = Session::new();
    session.apply(SessionEvent::FileSubmitted(sample_document("a.docx")));
    session.apply(SessionEvent::ResetRequested);
    assert_eq!(session.state(), &SessionState::Idle);

    let mut session = editing_session("b.docx", "text");
    session.apply(SessionEvent::ResetRequested);
    assert_eq!(session.state(), &SessionState::Idle);

    let mut session = editing_session("c.docx", "text");
    session.apply(SessionEvent::DownloadRequested);
    session.apply(SessionEvent::ResetRequested);
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn completion_after_reset_is_ignored() {
    let mut session = Session::new();
    let request = extract_request(
        &session.apply(SessionEvent::FileSubmitted(sample_document("a.docx"))),
    );
    session.apply(SessionEvent::ResetRequested);

    let effects = session.apply(SessionEvent::ExtractionFinished {
        request,
        result: Ok("late".to_string()),
    });
    assert!(effects.is_empty());
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn stale_extraction_does_not_complete_a_newer_upload() {
    let mut session = Session::new();
    let stale = extract_request(
        &session.apply(SessionEvent::FileSubmitted(sample_document("old.docx"))),
    );
    session.apply(SessionEvent::ResetRequested);
    let current = extract_request(
        &session.apply(SessionEvent::FileSubmitted(sample_document("new.docx"))),
    );
    assert_ne!(stale, current);

    session.apply(SessionEvent::ExtractionFinished {
        request: stale,
        result: Ok("old text".to_string()),
    });
    assert_eq!(session.phase(), Phase::Loading);

    session.apply(SessionEvent::ExtractionFinished {
        request: current,
        result: Ok("new text".to_string()),
    });
    let loaded = session.state().loaded().unwrap();
    assert_eq!(loaded.file_name(), "new.docx");
    assert_eq!(loaded.original_text(), "new text");
}

#[test]
fn download_completion_after_reset_saves_nothing() {
    let mut session = editing_session("a.docx", "text");
    let (request, _) = apply_request(&session.apply(SessionEvent::DownloadRequested));
    session.apply(SessionEvent::ResetRequested);

    let effects = session.apply(SessionEvent::ApplyFinished {
        request,
        result: Ok(vec![9]),
    });
    assert!(effects.is_empty());
    assert_eq!(session.phase(), Phase::Idle);
}
