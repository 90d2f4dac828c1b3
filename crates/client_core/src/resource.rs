//! Generic list / filter / search / mutate controller, instantiated once per
//! entity type from a [`ResourceConfig`].

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::{
    domain::{IdKind, ResourceId},
    error::FormatError,
    protocol::decode_list_response,
};
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    filter::{filtered_view, StatusFilter},
    messages::{success_notice, DisplayError, Locale, Operation},
    transport::{ApiRequest, AuthenticatedClient},
};

/// An item of a server-side collection.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Payload sent to the create and edit endpoints.
    type Draft: Serialize + Send + Sync;

    fn id(&self) -> &ResourceId;
    fn status(&self) -> Option<&str>;
    /// Text value of a searchable field, by backend field name.
    fn field(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Leave,
    Return,
    Freeze,
    Unfreeze,
    Fire,
    Rehire,
    SetEndDate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        Self::Leave,
        Self::Return,
        Self::Freeze,
        Self::Unfreeze,
        Self::Fire,
        Self::Rehire,
        Self::SetEndDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Return => "return",
            Self::Freeze => "freeze",
            Self::Unfreeze => "unfreeze",
            Self::Fire => "fire",
            Self::Rehire => "rehire",
            Self::SetEndDate => "end-date",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| format!("unknown action '{raw}'"))
    }
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    /// Body key carrying the target identifier.
    pub id_key: &'static str,
    /// Extra body fields the caller must supply.
    pub required: &'static [&'static str],
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            id_key: "id",
            required: &[],
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_id_key(mut self, id_key: &'static str) -> Self {
        self.id_key = id_key;
        self
    }

    pub fn requiring(mut self, fields: &'static [&'static str]) -> Self {
        self.required = fields;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub name: &'static str,
    pub id_kind: IdKind,
    pub list: Endpoint,
    /// Wrapper key recognized besides `data`, e.g. `admins`.
    pub plural_key: Option<&'static str>,
    pub list_query: Vec<(String, String)>,
    pub create: Option<Endpoint>,
    pub update: Option<Endpoint>,
    pub remove: Option<Endpoint>,
    pub actions: Vec<(ActionKind, Endpoint)>,
    pub search_fields: &'static [&'static str],
    pub statuses: &'static [&'static str],
}

impl ResourceConfig {
    pub fn action(&self, kind: ActionKind) -> Option<&Endpoint> {
        self.actions
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, endpoint)| endpoint)
    }

    pub fn supported_actions(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|(kind, _)| *kind).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Remove,
    Action(ActionKind),
}

impl MutationKind {
    pub fn operation(self) -> Operation {
        match self {
            Self::Create => Operation::Create,
            Self::Update => Operation::Update,
            Self::Remove => Operation::Remove,
            Self::Action(kind) => Operation::Action(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
    Mutating(MutationKind),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    pub open: bool,
    /// `None` means a submitted form creates; `Some` means it edits that item.
    pub editing: Option<ResourceId>,
    /// Bumped on every open and close so late submissions can tell they are stale.
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ResourceSnapshot<E> {
    pub phase: Phase,
    pub items: Vec<E>,
    pub filtered_items: Vec<E>,
    pub loading: bool,
    pub error: Option<DisplayError>,
    pub notice: Option<String>,
    pub status_filter: StatusFilter,
    pub query: String,
    pub dialog: DialogState,
    pub pending_delete: Option<ResourceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Idle,
    Ready,
    Failed,
}

struct ControllerState<E> {
    settled: Settled,
    loading: bool,
    mutation: Option<MutationKind>,
    items: Vec<E>,
    filtered: Vec<E>,
    status_filter: StatusFilter,
    query: String,
    error: Option<DisplayError>,
    notice: Option<String>,
    dialog: DialogState,
    pending_delete: Option<ResourceId>,
    list_query: Vec<(String, String)>,
    load_seq: u64,
    loaded_once: bool,
}

impl<E: Resource> ControllerState<E> {
    fn phase(&self) -> Phase {
        if let Some(kind) = self.mutation {
            return Phase::Mutating(kind);
        }
        if self.loading {
            return Phase::Loading;
        }
        match self.settled {
            Settled::Idle => Phase::Idle,
            Settled::Ready => Phase::Ready,
            Settled::Failed => Phase::Failed,
        }
    }

    fn refilter(&mut self, fields: &[&str]) {
        self.filtered = filtered_view(&self.items, &self.status_filter, &self.query, fields);
    }

    fn close_dialog(&mut self) {
        self.dialog.open = false;
        self.dialog.editing = None;
        self.dialog.generation += 1;
    }
}

enum SuccessEffect {
    CloseDialog { generation: u64 },
    ClearPendingDelete { id: ResourceId },
}

pub struct ResourceController<E: Resource> {
    client: Arc<AuthenticatedClient>,
    config: ResourceConfig,
    locale: Locale,
    inner: Mutex<ControllerState<E>>,
}

impl<E: Resource> ResourceController<E> {
    pub fn new(client: Arc<AuthenticatedClient>, config: ResourceConfig) -> Self {
        let list_query = config.list_query.clone();
        Self {
            client,
            config,
            locale: Locale::default(),
            inner: Mutex::new(ControllerState {
                settled: Settled::Idle,
                loading: false,
                mutation: None,
                items: Vec::new(),
                filtered: Vec::new(),
                status_filter: StatusFilter::All,
                query: String::new(),
                error: None,
                notice: None,
                dialog: DialogState::default(),
                pending_delete: None,
                list_query,
                load_seq: 0,
                loaded_once: false,
            }),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Turns user input into an id, taking the representation from a loaded
    /// item with the same printed id when there is one.
    pub fn resolve_id(&self, raw: &str) -> Option<ResourceId> {
        let raw = raw.trim();
        let loaded = self
            .state()
            .items
            .iter()
            .map(|item| item.id())
            .find(|id| id.to_string() == raw)
            .cloned();
        loaded.or_else(|| ResourceId::parse_as(self.config.id_kind, raw))
    }

    pub fn snapshot(&self) -> ResourceSnapshot<E> {
        let state = self.state();
        ResourceSnapshot {
            phase: state.phase(),
            items: state.items.clone(),
            filtered_items: state.filtered.clone(),
            loading: state.loading,
            error: state.error.clone(),
            notice: state.notice.clone(),
            status_filter: state.status_filter.clone(),
            query: state.query.clone(),
            dialog: state.dialog.clone(),
            pending_delete: state.pending_delete.clone(),
        }
    }

    /// Sets a list query parameter used by subsequent loads, e.g. the debtors month.
    pub fn set_list_query(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut state = self.state();
        match state.list_query.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value,
            None => state.list_query.push((key.to_string(), value)),
        }
    }

    pub fn set_filter(&self, status: impl Into<StatusFilter>) -> Vec<E> {
        let mut state = self.state();
        state.status_filter = status.into();
        state.refilter(self.config.search_fields);
        state.filtered.clone()
    }

    pub fn set_search(&self, query: impl Into<String>) -> Vec<E> {
        let mut state = self.state();
        state.query = query.into();
        state.refilter(self.config.search_fields);
        state.filtered.clone()
    }

    pub fn open_create_dialog(&self) -> Result<u64, ClientError> {
        if self.config.create.is_none() {
            return Err(self.unsupported("create"));
        }
        let mut state = self.state();
        state.dialog.open = true;
        state.dialog.editing = None;
        state.dialog.generation += 1;
        Ok(state.dialog.generation)
    }

    pub fn open_edit_dialog(&self, id: ResourceId) -> Result<u64, ClientError> {
        if self.config.update.is_none() {
            return Err(self.unsupported("update"));
        }
        let mut state = self.state();
        state.dialog.open = true;
        state.dialog.editing = Some(id);
        state.dialog.generation += 1;
        Ok(state.dialog.generation)
    }

    /// The item currently targeted by the edit dialog, if it is still loaded.
    pub fn editing_item(&self) -> Option<E> {
        let state = self.state();
        let id = state.dialog.editing.as_ref()?;
        state.items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn dismiss_dialog(&self) {
        let mut state = self.state();
        if state.dialog.open {
            state.close_dialog();
        }
    }

    pub fn request_delete(&self, id: ResourceId) {
        self.state().pending_delete = Some(id);
    }

    pub fn cancel_delete(&self) {
        self.state().pending_delete = None;
    }

    pub async fn load(&self) -> Result<usize, ClientError> {
        self.load_inner(true).await
    }

    async fn load_inner(&self, announce: bool) -> Result<usize, ClientError> {
        let (seq, request) = {
            let mut state = self.state();
            state.load_seq += 1;
            state.loading = true;
            let mut request = ApiRequest::new(
                self.config.list.method.clone(),
                self.config.list.path.clone(),
            );
            for (key, value) in &state.list_query {
                request = request.query(key.clone(), value.clone());
            }
            (state.load_seq, request)
        };

        let result = self
            .client
            .execute(request)
            .await
            .and_then(|response| {
                decode_list_response::<E>(response.body, self.config.plural_key)
                    .map_err(ClientError::from)
            });

        let mut state = self.state();
        if seq != state.load_seq {
            debug!(resource = self.config.name, seq, "discarding superseded list response");
            return result.map(|items| items.len());
        }
        state.loading = false;

        match result {
            Ok(items) => {
                let count = items.len();
                state.items = items;
                state.refilter(self.config.search_fields);
                state.settled = Settled::Ready;
                state.loaded_once = true;
                state.error = None;
                if announce {
                    state.notice = Some(success_notice(Operation::Load, Some(count), self.locale));
                }
                info!(resource = self.config.name, count, "collection loaded");
                Ok(count)
            }
            Err(err) => {
                if let ClientError::Format(format) = &err {
                    warn!(resource = self.config.name, reason = %format.reason, "malformed list response; clearing collection");
                    state.items.clear();
                    state.filtered.clear();
                    state.settled = Settled::Failed;
                } else {
                    warn!(resource = self.config.name, error = %err, "failed to load collection");
                    state.settled = if state.loaded_once {
                        Settled::Ready
                    } else {
                        Settled::Failed
                    };
                }
                state.error = Some(DisplayError::new(&err, Operation::Load, self.locale));
                state.notice = None;
                Err(err)
            }
        }
    }

    /// Creates or updates depending on the dialog's editing target.
    pub async fn submit(&self, draft: &E::Draft) -> Result<(), ClientError> {
        let editing = self.state().dialog.editing.clone();
        match editing {
            Some(id) => self.update(id, draft).await,
            None => self.create(draft).await,
        }
    }

    pub async fn create(&self, draft: &E::Draft) -> Result<(), ClientError> {
        let endpoint = self
            .config
            .create
            .as_ref()
            .ok_or_else(|| self.unsupported("create"))?;
        let body = draft_body(draft)?;
        let request = ApiRequest::new(endpoint.method.clone(), endpoint.path.clone()).json(body);
        let generation = self.state().dialog.generation;
        self.mutate(
            MutationKind::Create,
            request,
            SuccessEffect::CloseDialog { generation },
        )
        .await
    }

    pub async fn update(&self, id: ResourceId, draft: &E::Draft) -> Result<(), ClientError> {
        let endpoint = self
            .config
            .update
            .as_ref()
            .ok_or_else(|| self.unsupported("update"))?;
        let mut body = draft_body(draft)?;
        if let Value::Object(fields) = &mut body {
            fields.insert(endpoint.id_key.to_string(), id_value(&id));
        }
        let request = ApiRequest::new(endpoint.method.clone(), endpoint.path.clone()).json(body);
        let generation = self.state().dialog.generation;
        self.mutate(
            MutationKind::Update,
            request,
            SuccessEffect::CloseDialog { generation },
        )
        .await
    }

    pub async fn remove(&self, id: ResourceId) -> Result<(), ClientError> {
        let endpoint = self
            .config
            .remove
            .as_ref()
            .ok_or_else(|| self.unsupported("remove"))?;
        let request = targeted_request(endpoint, &id, Map::new())?;
        self.mutate(
            MutationKind::Remove,
            request,
            SuccessEffect::ClearPendingDelete { id },
        )
        .await
    }

    pub async fn secondary_action(&self, id: ResourceId, kind: ActionKind) -> Result<(), ClientError> {
        self.secondary_action_with(id, kind, Map::new()).await
    }

    /// Like [`Self::secondary_action`], for actions that carry extra fields (e.g. `end_date`).
    pub async fn secondary_action_with(
        &self,
        id: ResourceId,
        kind: ActionKind,
        extra: Map<String, Value>,
    ) -> Result<(), ClientError> {
        let endpoint = self
            .config
            .action(kind)
            .ok_or_else(|| self.unsupported(kind.as_str()))?;
        let request = targeted_request(endpoint, &id, extra)?;
        self.mutate(
            MutationKind::Action(kind),
            request,
            SuccessEffect::ClearPendingDelete { id },
        )
        .await
    }

    async fn mutate(
        &self,
        kind: MutationKind,
        request: ApiRequest,
        effect: SuccessEffect,
    ) -> Result<(), ClientError> {
        {
            let mut state = self.state();
            if let Some(running) = state.mutation {
                debug!(resource = self.config.name, ?running, ?kind, "mutation rejected while another is in flight");
                return Err(ClientError::Busy);
            }
            state.mutation = Some(kind);
        }

        let operation = kind.operation();
        let result = self.client.execute(request).await;

        {
            let mut state = self.state();
            state.mutation = None;
            match &result {
                Ok(_) => {
                    match effect {
                        SuccessEffect::CloseDialog { generation } => {
                            if state.dialog.open && state.dialog.generation == generation {
                                state.close_dialog();
                            } else {
                                debug!(resource = self.config.name, "dialog changed during submission; leaving it as is");
                            }
                        }
                        SuccessEffect::ClearPendingDelete { id } => {
                            if state.pending_delete.as_ref() == Some(&id) {
                                state.pending_delete = None;
                            }
                        }
                    }
                    state.error = None;
                    state.notice = Some(success_notice(operation, None, self.locale));
                    info!(resource = self.config.name, %operation, "mutation succeeded");
                }
                Err(err) => {
                    warn!(resource = self.config.name, %operation, error = %err, "mutation failed");
                    state.settled = Settled::Ready;
                    state.error = Some(DisplayError::new(err, operation, self.locale));
                    state.notice = None;
                }
            }
        }

        result?;
        // The server copy is authoritative; a failed refetch is already recorded in the snapshot.
        if let Err(err) = self.load_inner(false).await {
            debug!(resource = self.config.name, error = %err, "refetch after mutation failed");
        }
        Ok(())
    }

    fn unsupported(&self, operation: &'static str) -> ClientError {
        ClientError::Unsupported {
            resource: self.config.name,
            operation,
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState<E>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn id_value(id: &ResourceId) -> Value {
    match id {
        ResourceId::Num(value) => Value::from(*value),
        ResourceId::Text(value) => Value::from(value.clone()),
    }
}

fn draft_body<D: Serialize>(draft: &D) -> Result<Value, ClientError> {
    serde_json::to_value(draft)
        .map_err(|err| ClientError::Format(FormatError::new(format!("unserializable payload: {err}"))))
}

fn targeted_request(
    endpoint: &Endpoint,
    id: &ResourceId,
    mut extra: Map<String, Value>,
) -> Result<ApiRequest, ClientError> {
    for field in endpoint.required {
        let present = match extra.get(*field) {
            Some(Value::String(value)) => !value.trim().is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if !present {
            return Err(ClientError::MissingField((*field).to_string()));
        }
    }
    extra.insert(endpoint.id_key.to_string(), id_value(id));
    Ok(ApiRequest::new(endpoint.method.clone(), endpoint.path.clone()).json(Value::Object(extra)))
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_kind_parses_cli_names() {
        assert_eq!("end-date".parse::<ActionKind>(), Ok(ActionKind::SetEndDate));
        assert_eq!("Freeze".parse::<ActionKind>(), Ok(ActionKind::Freeze));
        assert!("archive".parse::<ActionKind>().is_err());
    }

    #[test]
    fn targeted_request_uses_configured_id_key() {
        let endpoint = Endpoint::post("/api/staff/leave-staff").with_id_key("staff_id");
        let request =
            targeted_request(&endpoint, &ResourceId::Num(7), Map::new()).expect("request");
        assert_eq!(request.body, Some(json!({"staff_id": 7})));
        assert_eq!(request.method, Method::POST);
    }

    #[test]
    fn targeted_request_enforces_required_fields() {
        let endpoint = Endpoint::put("/api/group/edit-end-group").requiring(&["end_date"]);
        let err = targeted_request(&endpoint, &ResourceId::from("g1"), Map::new())
            .expect_err("must fail");
        assert!(matches!(err, ClientError::MissingField(ref field) if field == "end_date"));

        let mut extra = Map::new();
        extra.insert("end_date".into(), json!("2026-12-31"));
        let request =
            targeted_request(&endpoint, &ResourceId::from("g1"), extra).expect("request");
        assert_eq!(
            request.body,
            Some(json!({"id": "g1", "end_date": "2026-12-31"}))
        );
    }
}
