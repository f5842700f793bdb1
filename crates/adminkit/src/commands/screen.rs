//! CRUD screen handlers shared by `users` and `posts`.
//!
//! Lists go through a `DataTable`, writes through the screen's
//! `EditModal`, reads and deletes through a JSON `Resource`.

use std::collections::BTreeMap;

use adminkit_api::{ApiClient, Object, Resource};
use adminkit_core::modal::record;
use adminkit_core::table::same_key;
use adminkit_core::{DataTable, Screen, ShowOptions, SortInfo, TableChange, TableOptions};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::cli::{CrudCommand, GlobalOpts, ListArgs, MoveArgs, OutputFormat, PageArgs};
use crate::error::CliError;
use crate::output;

use super::util;

type JsonResource = Resource<Value, Value, Value>;

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    client: &ApiClient,
    screen: &Screen,
    command: CrudCommand,
    global: &GlobalOpts,
    page_size: u32,
) -> Result<(), CliError> {
    match command {
        CrudCommand::List(args) => list(client, screen, args, global, page_size).await,
        CrudCommand::Get { id } => get(client, screen, &id, global).await,
        CrudCommand::Create { values } => create(client, screen, &values).await,
        CrudCommand::Update { id, values } => update(client, screen, &id, &values).await,
        CrudCommand::Delete { id } => delete(client, screen, &id, global).await,
    }
}

async fn list(
    client: &ApiClient,
    screen: &Screen,
    args: ListArgs,
    global: &GlobalOpts,
    page_size: u32,
) -> Result<(), CliError> {
    let search = screen.parse_values(
        &screen.search_fields,
        util::parse_pairs("search", &args.search)?,
    )?;
    let filters = util::filters(&args.filter)?;

    let mut table = open_table(client, screen, page_size);
    table.set_search(search);
    table.change(page_change(&args.page, filters)?).await?;

    output::print_output(&render_table(screen, &table, global), global.quiet);
    Ok(())
}

async fn get(
    client: &ApiClient,
    screen: &Screen,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let record = JsonResource::new(client, screen.route).get(id).await?;
    let out = output::render_single(&global.output_format(), &record, output::detail, |r| {
        output::cell(r.get("id"))
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn create(client: &ApiClient, screen: &Screen, raw: &[String]) -> Result<(), CliError> {
    let values = screen.parse_values(&screen.form_fields, util::parse_pairs("value", raw)?)?;

    let mut modal = screen.modal(client);
    modal.show(true, ShowOptions::default());
    modal.submit(values).await?;
    Ok(())
}

/// Open the edit form on the current record, change the given fields and
/// submit the whole form.
async fn update(client: &ApiClient, screen: &Screen, id: &str, raw: &[String]) -> Result<(), CliError> {
    let changes = screen.parse_values(&screen.form_fields, util::parse_pairs("value", raw)?)?;

    let mut current = record(JsonResource::new(client, screen.route).get(id).await?);
    current
        .entry("id")
        .or_insert_with(|| util::scalar(id));

    let mut values: Object = screen
        .form_fields
        .iter()
        .filter_map(|f| current.get(&f.key).map(|v| (f.key.clone(), v.clone())))
        .collect();
    values.extend(changes);

    let mut modal = screen.modal(client);
    modal.show(current, ShowOptions::default());
    modal.submit(values).await?;
    Ok(())
}

async fn delete(
    client: &ApiClient,
    screen: &Screen,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !util::confirm(&format!("Delete {} {id}?", screen.name), global.yes)? {
        return Ok(());
    }
    let message = JsonResource::new(client, screen.route).delete(id).await?;
    client
        .hooks()
        .notify_success(message.as_deref().unwrap_or("Deleted successfully"));
    Ok(())
}

/// Drag `args.id` onto `args.over` within one page, then show the page.
pub async fn move_row(
    client: &ApiClient,
    screen: &Screen,
    args: MoveArgs,
    global: &GlobalOpts,
    page_size: u32,
) -> Result<(), CliError> {
    if !screen.reorderable {
        return Err(CliError::validation(
            "move",
            format!("{} rows cannot be reordered", screen.name),
        ));
    }

    let mut table = open_table(client, screen, page_size);
    table.change(page_change(&args.page, BTreeMap::new())?).await?;

    let active = util::scalar(&args.id);
    let over = util::scalar(&args.over);
    for key in [&active, &over] {
        let visible = table
            .rows()
            .iter()
            .any(|row| row.get(table.row_key()).is_some_and(|k| same_key(k, key)));
        if !visible {
            return Err(CliError::NotFound {
                message: format!(
                    "{} {key} is not on page {}",
                    screen.name,
                    table.page_info().page
                ),
            });
        }
    }

    if table.drop_row(&active, &over).await? {
        client.hooks().notify_success("Order updated");
    }
    output::print_output(&render_table(screen, &table, global), global.quiet);
    Ok(())
}

// ── Table helpers ───────────────────────────────────────────────────

fn open_table(client: &ApiClient, screen: &Screen, page_size: u32) -> DataTable {
    screen.table(
        client,
        TableOptions {
            default_page_size: page_size,
            ..TableOptions::default()
        },
    )
}

fn page_change(
    args: &PageArgs,
    filters: BTreeMap<String, Option<Vec<Value>>>,
) -> Result<TableChange, CliError> {
    let sort = args
        .sort
        .as_deref()
        .map(str::parse::<SortInfo>)
        .transpose()?;
    Ok(TableChange {
        page: Some(args.page),
        size: args.size,
        filters,
        sort,
    })
}

fn render_table(screen: &Screen, table: &DataTable, global: &GlobalOpts) -> String {
    let format = global.output_format();
    let columns = table.columns();
    let headers: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
    let cells = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            columns
                .iter()
                .map(|c| {
                    if c.is_index() {
                        table.rank(i).to_string()
                    } else {
                        format_cell(&c.key, row.get(&c.key))
                    }
                })
                .collect()
        })
        .collect();

    let data = json!({ "data": table.rows(), "total": table.total() });
    let rendered = output::render_records(&format, &headers, cells, &data, |row| {
        output::cell(row.get(table.row_key()))
    });

    if format == OutputFormat::Table {
        format!(
            "{rendered}\n{}: page {} of {}, {} total",
            screen.title,
            table.page_info().page,
            table.page_count(),
            table.total()
        )
    } else {
        rendered
    }
}

/// Timestamps (`*At` columns) render as `YYYY-MM-DD HH:MM` UTC.
fn format_cell(key: &str, value: Option<&Value>) -> String {
    let timestamp = value
        .filter(|_| key.ends_with("At"))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
    match timestamp {
        Some(ts) => ts.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        None => output::cell(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_shortened() {
        let v = json!("2024-03-01T09:30:00.000Z");
        assert_eq!(format_cell("createdAt", Some(&v)), "2024-03-01 09:30");
        assert_eq!(format_cell("title", Some(&v)), "2024-03-01T09:30:00.000Z");
    }

    #[test]
    fn unparseable_timestamps_pass_through() {
        let v = json!("yesterday");
        assert_eq!(format_cell("updatedAt", Some(&v)), "yesterday");
    }
}
