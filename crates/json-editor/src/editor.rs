//! An editing session over one record.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use json_editor_pointer::PathStep;
use json_editor_schema::Schema;
use serde_json::Value;

use crate::config::JsonEditorConfig;
use crate::edit::{
    AnchorScope, CopyScope, Direction, EditOutcome, PendingEdit, StructuralEditEngine,
};
use crate::error::{EditError, EditorError};
use crate::node::Node;
use crate::previews::{extract_previews, Preview};
use crate::shortcut::{
    Dispatch, EditorAction, FocusResolver, KeyEvent, Keymap, Platform, ShortcutDispatcher,
};
use crate::store::{DocumentStore, ListenerId};
use crate::tabs::{group_document, TabGrouping};

/// What a keydown did.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Pending,
    PassThrough,
    Edited(EditOutcome),
}

pub struct JsonEditor {
    store: DocumentStore,
    schema: Rc<Schema>,
    config: JsonEditorConfig,
    engine: StructuralEditEngine,
    dispatcher: ShortcutDispatcher,
    tabs: Option<TabGrouping>,
    tab_groups: Rc<RefCell<IndexMap<String, Value>>>,
    tab_listener: Option<ListenerId>,
    previews: Vec<Preview>,
}

impl JsonEditor {
    /// Starts a session.
    ///
    /// # Errors
    ///
    /// A missing record or schema is fatal; so are an unreadable schema, an
    /// invalid tab pattern or chord, and a preview without a URL source. A
    /// missing config falls back to the defaults.
    pub fn new(
        record: Option<Value>,
        schema: Option<Value>,
        config: Option<JsonEditorConfig>,
        platform: Platform,
    ) -> Result<JsonEditor, EditorError> {
        let record = record
            .filter(|r| !r.is_null())
            .ok_or(EditorError::MissingInput("record"))?;
        let schema = schema
            .filter(|s| !s.is_null())
            .ok_or(EditorError::MissingInput("schema"))?;
        let config = config.unwrap_or_else(|| {
            tracing::warn!("no editor config given, using defaults");
            JsonEditorConfig::default()
        });

        let schema = Rc::new(Schema::from_json(&schema)?);
        let previews = extract_previews(&config.previews, &record)?;
        let keymap = Keymap::new(platform, &config.shortcuts)?;
        let tabs = config
            .tabs_config
            .as_ref()
            .map(|tabs| TabGrouping::new(tabs, &schema))
            .transpose()?;

        let store = DocumentStore::new(Node::from(&record));
        let tab_groups = Rc::new(RefCell::new(group_document(&record, tabs.as_ref())));
        let tab_listener = tabs.clone().map(|grouping| {
            let groups = tab_groups.clone();
            store.on_change(move |event| {
                *groups.borrow_mut() = grouping.group(&event.after.to_value());
            })
        });
        let engine = StructuralEditEngine::new(store.clone(), schema.clone());
        tracing::debug!(
            tabs = tabs.as_ref().map_or(0, |t| t.tab_names().len()),
            previews = previews.len(),
            "editor session started"
        );

        Ok(JsonEditor {
            store,
            schema,
            config,
            engine,
            dispatcher: ShortcutDispatcher::new(keymap),
            tabs,
            tab_groups,
            tab_listener,
            previews,
        })
    }

    /// Delivers the plain JSON of every accepted change.
    pub fn on_record_change<F>(&self, mut listener: F) -> ListenerId
    where
        F: FnMut(&Value) + 'static,
    {
        self.store
            .on_change(move |event| listener(&event.after.to_value()))
    }

    pub fn off_record_change(&self, id: ListenerId) -> bool {
        self.store.off_change(id)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn engine(&self) -> &StructuralEditEngine {
        &self.engine
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &JsonEditorConfig {
        &self.config
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    pub fn record(&self) -> Value {
        self.store.to_json()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// Tab names, or `None` when the record is shown without tabs.
    pub fn tab_names(&self) -> Option<&[String]> {
        self.tabs.as_ref().map(TabGrouping::tab_names)
    }

    /// Current sub-record of each tab.
    pub fn tab_groups(&self) -> IndexMap<String, Value> {
        self.tab_groups.borrow().clone()
    }

    pub fn tab_sub_schemas(&self) -> Option<IndexMap<String, Schema>> {
        self.tabs.as_ref().map(|tabs| tabs.sub_schemas(&self.schema))
    }

    pub fn dispatcher(&self) -> &ShortcutDispatcher {
        &self.dispatcher
    }

    /// Feeds a keydown to the shortcut dispatcher and runs the matched action.
    pub fn handle_key(
        &mut self,
        event: &KeyEvent,
        focus: &dyn FocusResolver,
        pending: Option<&PendingEdit>,
    ) -> Result<KeyOutcome, EditError> {
        match self.dispatcher.key_down(event, focus) {
            Dispatch::Pending => Ok(KeyOutcome::Pending),
            Dispatch::PassThrough => Ok(KeyOutcome::PassThrough),
            Dispatch::Action { action, path } => self
                .run_action(action, &path, pending)
                .map(KeyOutcome::Edited),
        }
    }

    pub fn handle_key_up(&mut self, event: &KeyEvent) {
        self.dispatcher.key_up(event);
    }

    pub fn tick(&mut self, now_ms: u64) {
        self.dispatcher.tick(now_ms);
    }

    pub fn run_action(
        &self,
        action: EditorAction,
        focused: &[PathStep],
        pending: Option<&PendingEdit>,
    ) -> Result<EditOutcome, EditError> {
        let scope = action.anchor_scope();
        let result = match action {
            EditorAction::AddRow | EditorAction::AddRowToRoot => {
                self.engine.insert_row(focused, scope, pending)
            }
            EditorAction::CopyRow | EditorAction::CopyRowFromRoot => {
                self.engine
                    .copy_row(focused, scope, CopyScope::Field, pending)
            }
            EditorAction::CopyRecord => {
                self.engine
                    .copy_row(focused, AnchorScope::Root, CopyScope::Record, pending)
            }
            EditorAction::MoveUp => self.engine.move_row(focused, Direction::Up, pending),
            EditorAction::MoveDown => self.engine.move_row(focused, Direction::Down, pending),
            EditorAction::Delete => self.engine.delete_row(focused, pending),
        };
        if let Err(err) = &result {
            tracing::warn!(action = action.name(), error = %err, "editor action rejected");
        }
        result
    }

    /// Commit on blur.
    pub fn commit_field(&self, edit: &PendingEdit) -> Result<EditOutcome, EditError> {
        self.engine.commit_field(edit)
    }
}

impl Drop for JsonEditor {
    fn drop(&mut self) {
        if let Some(id) = self.tab_listener.take() {
            self.store.off_change(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "titles": {"type": "array", "items": {"type": "object", "properties": {"title": {"type": "string"}}}},
                "control_number": {"type": "integer"}
            }
        })
    }

    #[test]
    fn test_missing_inputs() {
        let err = JsonEditor::new(None, Some(schema()), None, Platform::Other).err();
        assert!(matches!(err, Some(EditorError::MissingInput("record"))));
        let err = JsonEditor::new(Some(json!({})), Some(Value::Null), None, Platform::Other).err();
        assert!(matches!(err, Some(EditorError::MissingInput("schema"))));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let editor =
            JsonEditor::new(Some(json!({"control_number": 1})), Some(schema()), None, Platform::Other)
                .unwrap();
        assert!(editor.tab_names().is_none());
        assert_eq!(editor.tab_groups().len(), 1);
        assert!(editor.previews().is_empty());
    }

    #[test]
    fn test_tab_groups_follow_changes() {
        let config = JsonEditorConfig::from_json(json!({
            "tabsConfig": {"defaultTabName": "Main", "tabs": [{"name": "Titles", "properties": ["titles"]}]}
        }))
        .unwrap();
        let editor = JsonEditor::new(
            Some(json!({"titles": [{"title": "a"}], "control_number": 1})),
            Some(schema()),
            Some(config),
            Platform::Other,
        )
        .unwrap();
        editor
            .run_action(
                EditorAction::AddRow,
                &json_editor_pointer::parse_path("/titles/0/title"),
                None,
            )
            .unwrap();
        assert_eq!(
            editor.tab_groups()["Titles"],
            json!({"titles": [{"title": "a"}, {"title": ""}]})
        );
        assert_eq!(editor.tab_groups()["Main"], json!({"control_number": 1}));
    }
}
