// ── Edit modal driver ──
//
// Headless state for a single-record create/update form. `show` opens the
// form empty (create) or pre-filled from a record (edit); `submit` routes
// to the matching handler operation. A failed submit leaves the form open
// with the entered values; a successful one resets and closes it.

use std::future::Future;
use std::sync::Arc;

use adminkit_api::{Object, ResponseHooks, RouteProxy};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

// ── Form schema ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
}

/// One form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required: false,
        }
    }

    pub fn integer(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Integer,
            ..Self::text(key, label)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Convert raw user input into the field's JSON value.
    pub fn coerce(&self, raw: &str) -> Result<Value, CoreError> {
        match self.kind {
            FieldKind::Text => Ok(Value::String(raw.to_owned())),
            FieldKind::Integer => raw.trim().parse::<i64>().map(Value::from).map_err(|_| {
                CoreError::validation(format!("{} must be an integer, got '{raw}'", self.label))
            }),
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Check that every required field has a non-empty value.
pub fn validate(fields: &[FormField], values: &Object) -> Result<(), CoreError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| f.required && is_blank(values.get(&f.key)))
        .map(|f| f.label.as_str())
        .collect();
    match missing.as_slice() {
        [] => Ok(()),
        [one] => Err(CoreError::validation(format!("{one} is required"))),
        [init @ .., last] => Err(CoreError::validation(format!(
            "{} and {last} are required",
            init.join(", ")
        ))),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// The create and edit operations behind a modal.
#[async_trait]
pub trait EditHandler: Send + Sync {
    async fn create(&self, values: &Object) -> Result<(), CoreError>;

    async fn edit(&self, id: &Value, values: &Object, original: &Object) -> Result<(), CoreError>;
}

/// Handler bound to two routes: `create` receives a POST, `update` a PUT
/// with the record id as the path param.
#[derive(Debug, Clone)]
pub struct ProxyEditHandler {
    create: RouteProxy,
    update: RouteProxy,
    id_key: String,
}

impl ProxyEditHandler {
    pub fn new(create: RouteProxy, update: RouteProxy) -> Self {
        Self {
            create,
            update,
            id_key: "id".into(),
        }
    }

    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }
}

#[async_trait]
impl EditHandler for ProxyEditHandler {
    async fn create(&self, values: &Object) -> Result<(), CoreError> {
        self.create
            .post()
            .body(Value::Object(values.clone()))
            .send()
            .await?;
        Ok(())
    }

    async fn edit(&self, id: &Value, values: &Object, _original: &Object) -> Result<(), CoreError> {
        let mut params = Object::new();
        params.insert(self.id_key.clone(), id.clone());
        self.update
            .params(Value::Object(params))
            .put()
            .body(Value::Object(values.clone()))
            .send()
            .await?;
        Ok(())
    }
}

// ── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ModalMode {
    Create,
    Edit { id: Value, original: Object },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Initializing,
    Open(ModalMode),
    Submitting(ModalMode),
}

/// What to open the modal with.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowArg {
    /// `true` opens an empty form; `false` closes.
    Flag(bool),
    /// Opens pre-filled for editing.
    Record(Object),
}

impl From<bool> for ShowArg {
    fn from(open: bool) -> Self {
        Self::Flag(open)
    }
}

impl From<Object> for ShowArg {
    fn from(record: Object) -> Self {
        Self::Record(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShowOptions {
    pub readonly: bool,
    pub disabled: bool,
}

// ── EditModal ───────────────────────────────────────────────────────

pub struct EditModal<H: EditHandler> {
    name: String,
    id_key: String,
    fields: Vec<FormField>,
    handler: H,
    hooks: Arc<dyn ResponseHooks>,
    state: ModalState,
    options: ShowOptions,
    values: Object,
}

impl<H: EditHandler> std::fmt::Debug for EditModal<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditModal")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<H: EditHandler> EditModal<H> {
    pub fn new(name: impl Into<String>, handler: H, hooks: Arc<dyn ResponseHooks>) -> Self {
        Self {
            name: name.into(),
            id_key: "id".into(),
            fields: Vec::new(),
            handler,
            hooks,
            state: ModalState::Closed,
            options: ShowOptions::default(),
            values: Object::new(),
        }
    }

    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<FormField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_) | ModalState::Submitting(_))
    }

    pub fn options(&self) -> ShowOptions {
        self.options
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Current form values.
    pub fn values(&self) -> &Object {
        &self.values
    }

    fn mode(&self) -> Option<&ModalMode> {
        match &self.state {
            ModalState::Open(mode) | ModalState::Submitting(mode) => Some(mode),
            ModalState::Closed | ModalState::Initializing => None,
        }
    }

    pub fn title(&self) -> String {
        if self.options.readonly {
            return format!("{} details", self.name);
        }
        match self.mode() {
            Some(ModalMode::Edit { .. }) => format!("Edit {}", self.name),
            _ => format!("New {}", self.name),
        }
    }

    pub fn show(&mut self, arg: impl Into<ShowArg>, options: ShowOptions) {
        self.options = options;
        match arg.into() {
            ShowArg::Flag(false) => self.close(),
            ShowArg::Flag(true) => {
                self.values.clear();
                self.state = ModalState::Open(ModalMode::Create);
            }
            ShowArg::Record(record) => {
                let id = record.get(&self.id_key).cloned().unwrap_or(Value::Null);
                self.values = record.clone();
                self.state = ModalState::Open(ModalMode::Edit {
                    id,
                    original: record,
                });
            }
        }
    }

    /// Await `init`, then open with its result. A failed initializer leaves
    /// the modal closed.
    pub async fn show_with<F>(&mut self, init: F, options: ShowOptions)
    where
        F: Future<Output = Result<ShowArg, CoreError>>,
    {
        self.options = options;
        self.state = ModalState::Initializing;
        match init.await {
            Ok(arg) => self.show(arg, options),
            Err(e) => {
                debug!(modal = %self.name, error = %e, "initializer failed, modal stays closed");
                self.close();
            }
        }
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.state = ModalState::Closed;
        self.values.clear();
        self.options = ShowOptions::default();
    }

    /// Submit `values` through the handler. In edit mode the handler gets
    /// `(id, values, original)`; in create mode just `values`.
    pub async fn submit(&mut self, values: Object) -> Result<(), CoreError> {
        let mode = match &self.state {
            ModalState::Open(mode) => mode.clone(),
            ModalState::Submitting(_) => {
                return Err(CoreError::invalid_state("a submit is already in progress"));
            }
            ModalState::Closed | ModalState::Initializing => {
                return Err(CoreError::invalid_state(format!("{} form is not open", self.name)));
            }
        };
        if self.options.readonly {
            return Err(CoreError::invalid_state(format!("{} form is read-only", self.name)));
        }

        self.values = values;
        validate(&self.fields, &self.values)?;

        self.state = ModalState::Submitting(mode.clone());
        let result = match &mode {
            ModalMode::Edit { id, original } => {
                self.handler.edit(id, &self.values, original).await
            }
            ModalMode::Create => self.handler.create(&self.values).await,
        };

        match result {
            Ok(()) => {
                self.hooks.notify_success(match mode {
                    ModalMode::Edit { .. } => "Updated successfully",
                    ModalMode::Create => "Created successfully",
                });
                self.close();
                Ok(())
            }
            Err(e) => {
                self.state = ModalState::Open(mode);
                Err(e)
            }
        }
    }
}

/// Shorthand for building a record from `json!` literals.
pub fn record(value: Value) -> Object {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Object::new();
            map.insert("value".into(), other);
            map
        }
    }
}
