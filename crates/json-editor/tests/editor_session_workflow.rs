use std::cell::RefCell;
use std::rc::Rc;

use json_editor::{
    parse_path, Chord, EditorError, FocusTarget, JsonEditor, JsonEditorConfig, KeyEvent,
    KeyOutcome, Path, PathCache, PathStep, PendingEdit, Platform,
};
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "titles": {
                "type": "array",
                "items": {"type": "object", "properties": {"title": {"type": "string"}}}
            },
            "imprints": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "date": {"type": "string"},
                        "publisher": {"type": "string"}
                    }
                }
            },
            "references": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "reference": {
                            "type": "object",
                            "properties": {"title": {"type": "string"}}
                        }
                    }
                }
            },
            "documents": {"type": "array"}
        }
    })
}

fn record() -> Value {
    json!({
        "titles": [{"title": "X"}, {"title": "Y"}, {"title": "Z"}],
        "imprints": [{"date": "2017", "publisher": "CERN"}],
        "references": [{"reference": {"title": "R"}}],
        "documents": [{"url": "https://example.org/paper.pdf"}]
    })
}

fn config() -> JsonEditorConfig {
    JsonEditorConfig::from_json(json!({
        "tabsConfig": {
            "defaultTabName": "Main",
            "tabs": [{"name": "References", "properties": ["references"]}]
        },
        "previews": [{"name": "paper", "type": "pdf", "urlPath": ["documents", 0, "url"]}],
        "shortcuts": {"delete": {"key": "mod+d"}}
    }))
    .expect("config parses")
}

fn editor() -> JsonEditor {
    JsonEditor::new(Some(record()), Some(schema()), Some(config()), Platform::Other)
        .expect("editor starts")
}

fn press(editor: &mut JsonEditor, chord: &str, focus: &str, pending: Option<&PendingEdit>) -> KeyOutcome {
    let chord = Chord::parse(chord, Platform::Other).expect("chord parses");
    let focused = parse_path(focus);
    let resolver = move || -> Option<Path> { Some(focused.clone()) };
    editor
        .handle_key(&KeyEvent::chord(&chord, 0), &resolver, pending)
        .expect("edit accepted")
}

#[test]
fn session_setup() {
    let editor = editor();
    assert_eq!(
        editor.tab_names().unwrap(),
        ["References".to_owned(), "Main".to_owned()]
    );
    assert_eq!(editor.previews().len(), 1);
    assert_eq!(editor.previews()[0].url, "https://example.org/paper.pdf");
    let groups = editor.tab_groups();
    assert_eq!(groups["References"], json!({"references": [{"reference": {"title": "R"}}]}));
    assert!(groups["Main"].get("titles").is_some());
}

#[test]
fn missing_record_fails_before_anything_is_built() {
    let result = JsonEditor::new(None, Some(schema()), Some(config()), Platform::Other);
    assert!(matches!(result, Err(EditorError::MissingInput("record"))));
}

#[test]
fn invalid_schema_is_reported() {
    let result = JsonEditor::new(Some(record()), Some(json!({"type": "tensor"})), None, Platform::Other);
    assert!(matches!(result, Err(EditorError::Schema(_))));
}

#[test]
fn record_changes_reach_subscribers_as_plain_json() {
    let mut editor = editor();
    let emitted: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = emitted.clone();
    editor.on_record_change(move |json| sink.borrow_mut().push(json.clone()));

    press(&mut editor, "alt+a", "/titles/2/title", None);
    let emitted = emitted.borrow();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["titles"][3], json!({"title": ""}));
    assert_eq!(emitted[0], editor.record());
}

#[test]
fn shortcut_workflow_over_titles() {
    let mut editor = editor();
    let out = press(&mut editor, "ctrl+shift+down", "/titles/0/title", None);
    let KeyOutcome::Edited(out) = out else {
        panic!("expected an edit");
    };
    assert_eq!(out.focus, FocusTarget::Field(parse_path("/titles/1/title")));
    press(&mut editor, "ctrl+shift+down", "/titles/1/title", None);
    assert_eq!(
        editor.record()["titles"],
        json!([{"title": "Y"}, {"title": "Z"}, {"title": "X"}])
    );

    // Overridden delete chord; the default no longer fires.
    assert_eq!(
        press(&mut editor, "ctrl+backspace", "/titles/0/title", None),
        KeyOutcome::PassThrough
    );
    press(&mut editor, "ctrl+d", "/titles/0/title", None);
    assert_eq!(
        editor.record()["titles"],
        json!([{"title": "Z"}, {"title": "X"}])
    );
}

#[test]
fn copy_shortcuts() {
    let mut editor = editor();
    press(&mut editor, "alt+c", "/imprints/0/date", None);
    assert_eq!(
        editor.record()["imprints"],
        json!([
            {"date": "2017", "publisher": "CERN"},
            {"date": "", "publisher": "CERN"}
        ])
    );
    press(&mut editor, "ctrl+alt+r", "/references/0/reference/title", None);
    assert_eq!(
        editor.record()["references"],
        json!([{"reference": {"title": "R"}}, {"reference": {"title": "R"}}])
    );
    press(&mut editor, "ctrl+shift+b", "/titles/1/title", None);
    assert_eq!(editor.record()["titles"][2], json!({"title": ""}));
}

#[test]
fn move_with_pending_edit_keeps_typed_value() {
    let mut editor = editor();
    let pending = PendingEdit::new(parse_path("/titles/1/title"), json!("Y edited"), editor.revision());
    press(&mut editor, "ctrl+shift+up", "/titles/1/title", Some(&pending));
    assert_eq!(
        editor.record()["titles"],
        json!([{"title": "Y edited"}, {"title": "X"}, {"title": "Z"}])
    );
    // The blur that fires after the move lands on the moved row again.
    let out = editor.commit_field(&pending).unwrap();
    assert_eq!(out.focus, FocusTarget::Field(parse_path("/titles/0/title")));
    assert_eq!(editor.record()["titles"][0], json!({"title": "Y edited"}));
}

#[test]
fn tab_groups_follow_edits() {
    let mut editor = editor();
    press(&mut editor, "alt+a", "/references/0/reference/title", None);
    let groups = editor.tab_groups();
    assert_eq!(
        groups["References"]["references"].as_array().map(Vec::len),
        Some(2)
    );
}

#[test]
fn row_caches_drop_entries_moved_by_an_edit() {
    let mut editor = editor();
    let mut titles = PathCache::new(parse_path("/titles"));
    for index in 0..3 {
        titles.path_for(&PathStep::Index(index));
    }
    let mut title_row = PathCache::new(parse_path("/titles/2"));
    title_row.path_for(&PathStep::from("title"));

    let KeyOutcome::Edited(out) = press(&mut editor, "ctrl+shift+down", "/titles/0/title", None)
    else {
        panic!("expected an edit");
    };
    for remap in &out.remap {
        titles.invalidate(remap);
        title_row.invalidate(remap);
    }
    assert_eq!(titles.len(), 1);
    assert_eq!(title_row.len(), 1);
    assert_eq!(titles.path_for(&PathStep::Index(0)), &parse_path("/titles/0"));
}
