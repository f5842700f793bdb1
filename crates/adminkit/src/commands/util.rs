//! Shared helpers for command handlers.

use std::collections::BTreeMap;
use std::path::Path;

use adminkit_api::Object;
use serde_json::Value;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Prompt {
            message: e.to_string(),
        })?;
    Ok(confirmed)
}

/// Split `key=value` (or `key:value` with `sep = ':'`).
pub fn split_pair<'a>(arg: &'static str, raw: &'a str, sep: char) -> Result<(&'a str, &'a str), CliError> {
    match raw.split_once(sep) {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::validation(
            arg,
            format!("expected KEY{sep}VALUE, got '{raw}'"),
        )),
    }
}

pub fn parse_pairs<'a>(arg: &'static str, raw: &'a [String]) -> Result<Vec<(&'a str, &'a str)>, CliError> {
    raw.iter().map(|r| split_pair(arg, r, '=')).collect()
}

/// Scalar from the command line: integers, booleans and `null` keep their
/// JSON type, everything else is a string.
pub fn scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => raw
            .parse::<i64>()
            .map_or_else(|_| Value::String(raw.to_owned()), Value::from),
    }
}

/// Build a JSON object from `key=value` pairs. A repeated key collects its
/// values into an array.
pub fn pairs_to_object(arg: &'static str, raw: &[String]) -> Result<Object, CliError> {
    let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
    for (key, value) in parse_pairs(arg, raw)? {
        grouped.entry(key).or_default().push(scalar(value));
    }
    Ok(grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            (key.to_owned(), value)
        })
        .collect())
}

/// Column filters from `column=value` pairs, as selected widget values.
pub fn filters(raw: &[String]) -> Result<BTreeMap<String, Option<Vec<Value>>>, CliError> {
    let mut out: BTreeMap<String, Option<Vec<Value>>> = BTreeMap::new();
    for (key, value) in parse_pairs("filter", raw)? {
        out.entry(key.to_owned())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(scalar(value));
    }
    Ok(out)
}

/// Read and parse a JSON file for `--body-file`.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        CliError::validation("body-file", format!("invalid JSON in {}: {e}", path.display()))
    })
}
