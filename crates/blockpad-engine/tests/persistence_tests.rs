//! Save/load behavior through the session and the file-backed store.

use blockpad_engine::{SaveOutcome, Session, Store};
use pretty_assertions::assert_eq;

fn type_str(session: &mut Session, text: &str) {
    for ch in text.chars() {
        session.on_before_input(ch).expect("input");
    }
}

#[test]
fn saved_session_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());

    let mut session = Session::new();
    type_str(&mut session, "# Notes");
    session.on_key_command("split-block").unwrap();
    type_str(&mut session, "* bold words");

    assert_eq!(session.save_to(&store).unwrap(), SaveOutcome::Saved);

    let reloaded = Session::from_store(&store).unwrap();
    assert_eq!(reloaded.document(), session.document());
    // Caret starts at the end of the reloaded content.
    let last = reloaded.document().blocks().last().unwrap();
    assert_eq!(reloaded.selection().focus_block, last.id);
    assert_eq!(reloaded.selection().focus_offset, last.char_len());
}

#[test]
fn blank_document_save_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("data"));

    let session = Session::new();
    assert_eq!(
        session.save_to(&store).unwrap(),
        SaveOutcome::NothingToSave
    );
    assert!(!store.blob_path().exists());

    // Whitespace-only content is still "nothing to save".
    let mut session = Session::new();
    type_str(&mut session, "   ");
    assert_eq!(
        session.save_to(&store).unwrap(),
        SaveOutcome::NothingToSave
    );
    assert!(!store.blob_path().exists());
}

#[test]
fn corrupt_blob_falls_back_to_empty_and_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    std::fs::write(store.blob_path(), "{definitely not json").unwrap();

    let session = Session::from_store(&store).unwrap();
    assert!(session.document().is_blank());

    // The corrupt blob must survive until the user actually saves.
    let bytes = std::fs::read(store.blob_path()).unwrap();
    assert_eq!(bytes, b"{definitely not json");
}

#[test]
fn semantically_invalid_blob_also_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    // Valid JSON, but the style range points past the text.
    let blob = r#"{"blocks":[{"key":"0196fd2e-0000-7000-8000-000000000000","type":"unstyled","text":"ab","inlineStyleRanges":[{"offset":0,"length":9,"style":"BOLD"}]}]}"#;
    std::fs::write(store.blob_path(), blob).unwrap();

    let session = Session::from_store(&store).unwrap();
    assert!(session.document().is_blank());
}

#[test]
fn overflowing_style_offset_also_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    // Offsets so large that offset + length wraps around usize.
    let blob = format!(
        r#"{{"blocks":[{{"key":"0196fd2e-0000-7000-8000-000000000000","type":"unstyled","text":"ab","inlineStyleRanges":[{{"offset":{},"length":2,"style":"BOLD"}}]}}]}}"#,
        usize::MAX
    );
    std::fs::write(store.blob_path(), blob).unwrap();

    let session = Session::from_store(&store).unwrap();
    assert!(session.document().is_blank());
}

#[test]
fn missing_blob_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("never-created"));
    let session = Session::from_store(&store).unwrap();
    assert!(session.document().is_blank());
    assert_eq!(session.version(), 0);
}

#[test]
fn save_after_corrupt_load_overwrites_the_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path());
    std::fs::write(store.blob_path(), "garbage").unwrap();

    let mut session = Session::from_store(&store).unwrap();
    type_str(&mut session, "fresh");
    assert_eq!(session.save_to(&store).unwrap(), SaveOutcome::Saved);

    let reloaded = Session::from_store(&store).unwrap();
    assert_eq!(reloaded.document().blocks()[0].text(), "fresh");
}
