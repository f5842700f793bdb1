//! Headless drivers behind the adminkit CRUD screens.
//!
//! - **[`DataTable`]** keeps pagination, sort, column filters, search values,
//!   selection and drag order for a list route, and refetches on every
//!   parameter change. Responses for superseded parameters are discarded.
//!
//! - **[`EditModal`]** holds one create/edit form. It dispatches to an
//!   [`EditHandler`] depending on whether it was opened with a record.
//!
//! - **[`Screen`]** declares the users and posts screens and wires both
//!   drivers to an [`adminkit_api::ApiClient`].

pub mod config;
pub mod error;
pub mod modal;
pub mod screens;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ClientConfig;
pub use error::CoreError;
pub use modal::{
    EditHandler, EditModal, FieldKind, FormField, ModalMode, ModalState, ProxyEditHandler,
    ShowArg, ShowOptions,
};
pub use screens::Screen;
pub use table::{
    ColumnSpec, DataTable, FetchTicket, PageInfo, ReorderRequest, SortDirection, SortInfo,
    TableChange, TableOptions, TableParams, TableStatus,
};
