// ── CRUD screens ──
//
// Declarative definitions of the users and posts screens: which columns
// the table shows, which fields the search and edit forms carry, and how
// both drivers bind to the admin routes.

use adminkit_api::routes::{ITEM, SORT};
use adminkit_api::{ApiClient, Object};

use crate::error::CoreError;
use crate::modal::{EditModal, FormField, ProxyEditHandler};
use crate::table::{ColumnSpec, DataTable, TableOptions};

#[derive(Debug, Clone)]
pub struct Screen {
    /// Singular display name, used in modal titles.
    pub name: &'static str,
    /// Collection route segment.
    pub route: &'static str,
    pub title: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub search_fields: Vec<FormField>,
    pub form_fields: Vec<FormField>,
    /// Rows can be dragged; order changes are posted to `<route>.sort`.
    pub reorderable: bool,
}

impl Screen {
    pub fn users() -> Self {
        Self {
            name: "user",
            route: "users",
            title: "Users",
            columns: vec![
                ColumnSpec::index(),
                ColumnSpec::new("id", "ID").sortable(),
                ColumnSpec::new("name", "Name").sortable(),
                ColumnSpec::new("email", "Email"),
                ColumnSpec::new("avatar", "Avatar"),
            ],
            search_fields: vec![
                FormField::text("name", "Name"),
                FormField::text("email", "Email"),
            ],
            form_fields: vec![
                FormField::text("name", "Name").required(),
                FormField::text("email", "Email").required(),
                FormField::text("avatar", "Avatar"),
            ],
            reorderable: false,
        }
    }

    pub fn posts() -> Self {
        Self {
            name: "post",
            route: "posts",
            title: "Posts",
            columns: vec![
                ColumnSpec::index(),
                ColumnSpec::new("id", "ID").sortable(),
                ColumnSpec::new("title", "Title").sortable(),
                ColumnSpec::new("authorId", "Author").filter_multiple(),
                ColumnSpec::new("createdAt", "Created").sortable(),
            ],
            search_fields: vec![
                FormField::text("title", "Title"),
                FormField::integer("authorId", "Author"),
            ],
            form_fields: vec![
                FormField::text("title", "Title").required(),
                FormField::text("content", "Content").required(),
                FormField::integer("authorId", "Author").required(),
            ],
            reorderable: true,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::users(), Self::posts()]
    }

    pub fn by_route(route: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.route == route)
    }

    /// Table bound to this screen's list route. `options.columns` is
    /// replaced by the screen's columns.
    pub fn table(&self, client: &ApiClient, options: TableOptions) -> DataTable {
        let options = TableOptions {
            columns: self.columns.clone(),
            ..options
        };
        let table = DataTable::new(client.route(self.route), options);
        if self.reorderable {
            table.with_reorder(client.route(self.route).path(SORT))
        } else {
            table
        }
    }

    /// Edit modal posting to the collection and updating through its item
    /// route.
    pub fn modal(&self, client: &ApiClient) -> EditModal<ProxyEditHandler> {
        let collection = client.route(self.route);
        let handler = ProxyEditHandler::new(collection.clone(), collection.path(ITEM));
        EditModal::new(self.name, handler, client.hooks()).with_fields(self.form_fields.clone())
    }

    /// Build form values from `key=value` input, coercing by field kind.
    /// Keys the form does not know are rejected.
    pub fn parse_values<'a, I>(&self, fields: &[FormField], pairs: I) -> Result<Object, CoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values = Object::new();
        for (key, raw) in pairs {
            let field = fields.iter().find(|f| f.key == key).ok_or_else(|| {
                let known: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
                CoreError::validation(format!(
                    "unknown {} field '{key}' (expected one of: {})",
                    self.name,
                    known.join(", ")
                ))
            })?;
            values.insert(field.key.clone(), field.coerce(raw)?);
        }
        Ok(values)
    }
}
