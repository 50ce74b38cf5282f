use std::sync::Arc;

use dd_core::{DecodeErrorKind, FieldKey, NameDirectory, Node, encode, name_hash};
use dd_edit::{EditSession, ParseErrorKind};

fn wallet_bytes() -> Vec<u8> {
    encode(&Node::Object(vec![
        (FieldKey::Name("currency".into()), Node::Int(1000)),
        (FieldKey::Unresolved(name_hash("trinket_count")), Node::Int(3)),
    ]))
}

fn directory_with(names: &[&str]) -> Arc<NameDirectory> {
    let dir = Arc::new(NameDirectory::new());
    dir.learn_all(names.iter().copied());
    dir
}

#[test]
fn load_edit_commit_scenario() {
    // The two-field wallet: currency resolved, trinket count not.
    let dir = directory_with(&["currency"]);
    let mut session = EditSession::new(Arc::clone(&dir));

    let original = wallet_bytes();
    let text = session.load_bytes(&original).expect("wallet should load");
    assert!(text.contains("\"currency\": 1000"));
    let sentinel = format!("###{}: 3", name_hash("trinket_count"));
    assert!(text.contains(&sentinel), "missing {sentinel} in:\n{text}");

    let edited = text.replace("1000", "2500");
    session.validate_edit(&edited).expect("edit should validate");
    let committed = session.commit(&edited).expect("edit should commit");

    // Only the currency payload bytes changed.
    assert_eq!(original.len(), committed.len());
    let differing: Vec<usize> = (0..original.len())
        .filter(|&i| original[i] != committed[i])
        .collect();
    assert!(!differing.is_empty());
    assert!(differing.len() <= 4);

    // The unresolved field's key and value bytes are untouched.
    let tail = original.len() - (4 + 1 + 4);
    assert_eq!(&original[tail..], &committed[tail..]);
}

#[test]
fn invalid_edit_never_reaches_the_encoder() {
    let dir = directory_with(&["currency"]);
    let mut session = EditSession::new(dir);
    let text = session.load_bytes(&wallet_bytes()).expect("wallet should load");

    let broken = text.replace(':', ";");
    let err = session.validate_edit(&broken).expect_err("edit should fail");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedChar(';'));
    assert!(err.line >= 1 && err.column >= 1);

    // Commit refuses the same text; the in-session tree is unchanged and
    // still re-encodes to the original bytes.
    session.commit(&broken).expect_err("commit should fail");
    let recovered = session
        .current_text()
        .expect("session should still hold the loaded tree");
    assert_eq!(session.commit(&recovered).expect("clean commit"), wallet_bytes());
}

#[test]
fn decode_failure_leaves_session_reusable() {
    let dir = directory_with(&[]);
    let mut session = EditSession::new(dir);

    let err = session.load_bytes(b"not a save").expect_err("junk should not load");
    assert_eq!(err.kind, DecodeErrorKind::BadMagic);
    assert!(!session.is_loaded());

    session.load_bytes(&wallet_bytes()).expect("valid bytes should load");
    assert!(session.is_loaded());
}

#[test]
fn sessions_are_independent() {
    // A parse error in one file's session must not affect another's.
    let dir = directory_with(&["currency"]);
    let mut broken = EditSession::new(Arc::clone(&dir));
    let mut healthy = EditSession::new(dir);

    broken.load_bytes(&wallet_bytes()).expect("load");
    healthy.load_bytes(&wallet_bytes()).expect("load");

    broken.commit("{ oops").expect_err("bad edit should fail");
    let text = healthy.current_text().expect("healthy session has a tree");
    assert_eq!(healthy.commit(&text).expect("healthy commit"), wallet_bytes());
}

#[test]
fn commit_output_reloads_identically() {
    let dir = directory_with(&["currency"]);
    let mut session = EditSession::new(dir);

    let text = session.load_bytes(&wallet_bytes()).expect("load");
    let bytes = session.commit(&text).expect("commit");
    let text_again = session.load_bytes(&bytes).expect("reload");
    assert_eq!(text, text_again);
}
