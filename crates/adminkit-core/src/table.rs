// ── Data table driver ──
//
// Headless state for a paginated, sortable, filterable list bound to a
// route proxy. Every user event (page, sort, filter, search) updates the
// parameter state and refetches. Rows are replaced wholesale by each
// successful fetch; failures keep the last known rows. Responses are keyed
// by their full query so a slow response for an obsolete parameter set
// can never overwrite a newer one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use adminkit_api::models::ListPage;
use adminkit_api::{Object, RouteProxy};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Column key rendered as the 1-based row rank across pages.
pub const INDEX_KEY: &str = "@index";

// ── Parameter state ─────────────────────────────────────────────────

/// Current page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub size: u32,
}

impl PageInfo {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[strum(to_string = "asc", serialize = "ascend")]
    Asc,
    #[strum(to_string = "desc", serialize = "descend")]
    Desc,
}

/// A single `(field, direction)` sort. A table sorts by at most one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortInfo {
    pub field: String,
    pub direction: SortDirection,
}

impl SortInfo {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl fmt::Display for SortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// Parses `field`, `field:asc` or `field:desc`. A bare field sorts ascending.
impl FromStr for SortInfo {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, dir)) => {
                let direction = dir.parse::<SortDirection>().map_err(|_| {
                    CoreError::validation(format!("unknown sort direction '{dir}'"))
                })?;
                (field, direction)
            }
            None => (s, SortDirection::Asc),
        };
        let field = field.trim();
        if field.is_empty() {
            return Err(CoreError::validation("sort field must not be empty"));
        }
        Ok(Self::new(field, direction))
    }
}

/// Sorting query value: `"<field> <asc|desc>"`, or empty when unsorted.
pub fn sorting_param(sort: Option<&SortInfo>) -> String {
    sort.map(ToString::to_string).unwrap_or_default()
}

// ── Columns ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: String,
    pub title: String,
    pub sortable: bool,
    /// Multi-select filters send an array; single-select send one value.
    pub filter_multiple: bool,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            sortable: false,
            filter_multiple: false,
        }
    }

    /// The rank column.
    pub fn index() -> Self {
        Self::new(INDEX_KEY, "#")
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filter_multiple(mut self) -> Self {
        self.filter_multiple = true;
        self
    }

    pub fn is_index(&self) -> bool {
        self.key == INDEX_KEY
    }
}

// ── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Field that identifies a row across fetches.
    pub row_key: String,
    pub default_page_size: u32,
    /// Extra attempts after a failed list fetch.
    pub retry: u32,
    pub columns: Vec<ColumnSpec>,
    /// Merged last into every list query.
    pub base_query: Object,
    pub selectable: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            row_key: "id".into(),
            default_page_size: 10,
            retry: 1,
            columns: Vec::new(),
            base_query: Object::new(),
            selectable: false,
        }
    }
}

// ── Events and snapshots ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStatus {
    #[default]
    Idle,
    Fetching,
}

/// One combined pagination/filter/sort change, as a table widget reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableChange {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Selected filter values per column; `None` clears the filter.
    pub filters: BTreeMap<String, Option<Vec<Value>>>,
    /// `None` clears sorting.
    pub sort: Option<SortInfo>,
}

/// Parameters of the current view, for export and similar consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct TableParams {
    /// Submitted search form values.
    pub query: Object,
    pub page_info: PageInfo,
    pub sort_info: Option<SortInfo>,
}

/// An issued list request. Only the most recently issued ticket may update
/// the table.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    seq: u64,
    key: String,
    query: Object,
}

impl FetchTicket {
    pub fn query(&self) -> &Object {
        &self.query
    }

    /// Run the list request for this ticket, retrying transport failures and
    /// 5xx responses up to `retry` times.
    pub async fn run(&self, list: &RouteProxy, retry: u32) -> Result<ListPage<Value>, CoreError> {
        let request = list.get().query(Value::Object(self.query.clone()));
        let mut attempt = 0;
        loop {
            match request.send().await.and_then(ListPage::from_value) {
                Ok(page) => return Ok(page),
                Err(e) if attempt < retry && e.is_transient() => {
                    attempt += 1;
                    debug!(attempt, error = %e, "list fetch failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Result of an optimistic drag move, to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderRequest {
    /// Row key of the moved row.
    pub key: Value,
    /// Signed index delta: target index minus source index.
    pub dir: i64,
}

// ── DataTable ───────────────────────────────────────────────────────

/// Table state bound to a list route (and optionally a reorder route).
pub struct DataTable {
    list: RouteProxy,
    reorder: Option<RouteProxy>,
    options: TableOptions,
    page_info: PageInfo,
    sort: Option<SortInfo>,
    filters: Object,
    search: Object,
    rows: Vec<Value>,
    total: u64,
    selected: Vec<Value>,
    status: TableStatus,
    fetch_seq: u64,
    latest_key: Option<String>,
}

impl fmt::Debug for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("list", &self.list.template())
            .field("page_info", &self.page_info)
            .field("sort", &self.sort)
            .field("rows", &self.rows.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl DataTable {
    pub fn new(list: RouteProxy, options: TableOptions) -> Self {
        let page_info = PageInfo::new(1, options.default_page_size);
        Self {
            list,
            reorder: None,
            options,
            page_info,
            sort: None,
            filters: Object::new(),
            search: Object::new(),
            rows: Vec::new(),
            total: 0,
            selected: Vec::new(),
            status: TableStatus::Idle,
            fetch_seq: 0,
            latest_key: None,
        }
    }

    /// Enable persisting drag reorders through `route`.
    pub fn with_reorder(mut self, route: RouteProxy) -> Self {
        self.reorder = Some(route);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// Deep copy of the current rows, safe to mutate.
    pub fn rows_snapshot(&self) -> Vec<Value> {
        self.rows.clone()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn page_info(&self) -> PageInfo {
        self.page_info
    }

    pub fn sort_info(&self) -> Option<&SortInfo> {
        self.sort.as_ref()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.options.columns
    }

    pub fn row_key(&self) -> &str {
        &self.options.row_key
    }

    /// Page count for the current size; at least 1.
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_info.size.max(1))).max(1)
    }

    /// 1-based rank of the row at `index` on the current page.
    pub fn rank(&self, index: usize) -> u64 {
        let PageInfo { page, size } = self.page_info;
        let index = u64::try_from(index).unwrap_or(u64::MAX);
        u64::from(page).saturating_sub(1) * u64::from(size) + index + 1
    }

    pub fn params(&self) -> TableParams {
        TableParams {
            query: self.search.clone(),
            page_info: self.page_info,
            sort_info: self.sort.clone(),
        }
    }

    /// Replace page info without fetching. Page and size are clamped to 1.
    pub fn set_page_info(&mut self, page_info: PageInfo) {
        self.page_info = PageInfo::new(page_info.page, page_info.size);
    }

    // ── Query composition ────────────────────────────────────────────

    /// `{page, page_size, sorting, ...search, ...filters, ...base_query}`;
    /// later entries override earlier ones with the same key.
    pub fn query(&self) -> Object {
        let mut query = Object::new();
        query.insert("page".into(), json!(self.page_info.page));
        query.insert("page_size".into(), json!(self.page_info.size));
        query.insert("sorting".into(), json!(sorting_param(self.sort.as_ref())));
        for source in [&self.search, &self.filters, &self.options.base_query] {
            for (k, v) in source {
                query.insert(k.clone(), v.clone());
            }
        }
        query
    }

    /// Normalize raw filter selections: multi-select columns keep the array,
    /// single-select columns keep the first value, empty selections drop out.
    pub fn normalize_filters(&self, raw: BTreeMap<String, Option<Vec<Value>>>) -> Object {
        let mut out = Object::new();
        for (key, values) in raw {
            let multiple = self
                .options
                .columns
                .iter()
                .find(|c| c.key == key)
                .is_some_and(|c| c.filter_multiple);
            let value = match values {
                Some(values) if multiple && !values.is_empty() => Value::Array(values),
                Some(values) if !multiple => match values.into_iter().next() {
                    Some(first) => first,
                    None => continue,
                },
                _ => continue,
            };
            out.insert(key, value);
        }
        out
    }

    // ── Fetch cycle ──────────────────────────────────────────────────

    /// Record a new request for the current parameters. Every ticket issued
    /// earlier becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let query = self.query();
        let key = Value::Object(query.clone()).to_string();
        self.fetch_seq += 1;
        self.latest_key = Some(key.clone());
        self.status = TableStatus::Fetching;
        FetchTicket {
            seq: self.fetch_seq,
            key,
            query,
        }
    }

    /// Apply the outcome of `ticket`. Returns `Ok(false)` when the ticket
    /// was stale and the result discarded. On failure the previous rows
    /// stay in place.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListPage<Value>, CoreError>,
    ) -> Result<bool, CoreError> {
        let latest = ticket.seq == self.fetch_seq
            && self.latest_key.as_deref() == Some(ticket.key.as_str());
        if !latest {
            warn!(seq = ticket.seq, query = %ticket.key, "discarding stale list response");
            return Ok(false);
        }
        self.status = TableStatus::Idle;

        let page = result?;
        self.total = page.total;
        self.rows = page.data;
        self.refresh_selection();
        debug!(rows = self.rows.len(), total = self.total, "table refreshed");
        Ok(true)
    }

    /// Fetch the current parameters and apply the result.
    pub async fn fetch_data(&mut self) -> Result<(), CoreError> {
        let ticket = self.begin_fetch();
        let result = ticket.run(&self.list, self.options.retry).await;
        self.complete_fetch(ticket, result).map(|_| ())
    }

    // ── Events ───────────────────────────────────────────────────────

    pub async fn mount(&mut self) -> Result<(), CoreError> {
        self.fetch_data().await
    }

    pub async fn set_page(&mut self, page: u32, size: u32) -> Result<(), CoreError> {
        self.page_info = PageInfo::new(page, size);
        self.fetch_data().await
    }

    /// Replace the sort; `None` clears it.
    pub async fn set_sort(&mut self, sort: Option<SortInfo>) -> Result<(), CoreError> {
        self.sort = sort;
        self.fetch_data().await
    }

    pub async fn set_filters(
        &mut self,
        filters: BTreeMap<String, Option<Vec<Value>>>,
    ) -> Result<(), CoreError> {
        self.filters = self.normalize_filters(filters);
        self.fetch_data().await
    }

    /// Apply a combined widget change without fetching. Missing page/size
    /// fall back to the first page and the default page size.
    pub fn apply_change(&mut self, change: TableChange) {
        self.filters = self.normalize_filters(change.filters);
        self.sort = change.sort;
        self.page_info = PageInfo::new(
            change.page.unwrap_or(1),
            change.size.unwrap_or(self.options.default_page_size),
        );
    }

    pub async fn change(&mut self, change: TableChange) -> Result<(), CoreError> {
        self.apply_change(change);
        self.fetch_data().await
    }

    /// Replace the search values without fetching.
    pub fn set_search(&mut self, values: Object) {
        self.search = values;
    }

    /// Submit the search form.
    pub async fn submit_search(&mut self, values: Object) -> Result<(), CoreError> {
        self.set_search(values);
        self.fetch_data().await
    }

    // ── Selection ────────────────────────────────────────────────────

    fn key_of<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        row.get(&self.options.row_key)
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| self.key_of(row).is_some_and(|k| same_key(k, key)))
    }

    fn is_selected(&self, key: &Value) -> bool {
        self.selected
            .iter()
            .any(|row| self.key_of(row).is_some_and(|k| same_key(k, key)))
    }

    /// Select or deselect the visible row with `key`. Returns whether the
    /// row is selected afterwards.
    pub fn toggle_row(&mut self, key: &Value) -> Result<bool, CoreError> {
        if !self.options.selectable {
            return Err(CoreError::invalid_state("table is not selectable"));
        }
        if self.is_selected(key) {
            let row_key = self.options.row_key.clone();
            self.selected
                .retain(|row| !row.get(&row_key).is_some_and(|k| same_key(k, key)));
            return Ok(false);
        }
        let Some(index) = self.position(key) else {
            return Err(CoreError::NotFound {
                message: format!("no row with {} {key}", self.options.row_key),
            });
        };
        self.selected.push(self.rows[index].clone());
        Ok(true)
    }

    pub fn selected_rows(&self) -> Vec<Value> {
        self.selected.clone()
    }

    pub fn selected_keys(&self) -> Vec<Value> {
        self.selected
            .iter()
            .filter_map(|row| self.key_of(row).cloned())
            .collect()
    }

    pub fn set_selected_rows(&mut self, rows: Vec<Value>) {
        self.selected = rows;
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected rows survive refetches; rows visible again get fresh data.
    fn refresh_selection(&mut self) {
        let mut selected = std::mem::take(&mut self.selected);
        for row in &mut selected {
            let fresh = self
                .key_of(row)
                .and_then(|k| self.position(k))
                .map(|i| self.rows[i].clone());
            if let Some(fresh) = fresh {
                *row = fresh;
            }
        }
        self.selected = selected;
    }

    // ── Reorder ──────────────────────────────────────────────────────

    /// Move the row keyed `active` to the position of the row keyed `over`,
    /// immediately. Returns `None` when nothing moved.
    pub fn move_row(&mut self, active: &Value, over: &Value) -> Option<ReorderRequest> {
        if same_key(active, over) {
            return None;
        }
        let from = self.position(active)?;
        let to = self.position(over)?;
        let row = self.rows.remove(from);
        self.rows.insert(to, row);

        let from = i64::try_from(from).ok()?;
        let to = i64::try_from(to).ok()?;
        Some(ReorderRequest {
            key: active.clone(),
            dir: to - from,
        })
    }

    /// Body sent to the reorder route: `{<row_key>: key, dir}`.
    pub fn reorder_body(&self, request: &ReorderRequest) -> Value {
        let mut body = Object::new();
        body.insert(self.options.row_key.clone(), request.key.clone());
        body.insert("dir".into(), json!(request.dir));
        Value::Object(body)
    }

    /// Send a reorder to the server. The local order is left as is when
    /// this fails.
    pub async fn persist_reorder(&self, request: &ReorderRequest) -> Result<(), CoreError> {
        let Some(route) = &self.reorder else {
            return Ok(());
        };
        match route.post().body(self.reorder_body(request)).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(key = %request.key, dir = request.dir, error = %e, "reorder not persisted");
                Err(e.into())
            }
        }
    }

    /// Drag end: optimistic move, then persist. Returns whether a move
    /// happened.
    pub async fn drop_row(&mut self, active: &Value, over: &Value) -> Result<bool, CoreError> {
        let Some(request) = self.move_row(active, over) else {
            return Ok(false);
        };
        self.persist_reorder(&request).await?;
        Ok(true)
    }
}

/// Row keys match by value, or by their string form (`7` == `"7"`).
pub fn same_key(a: &Value, b: &Value) -> bool {
    fn text(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
    a == b || text(a).is_some_and(|ta| text(b).is_some_and(|tb| ta == tb))
}
