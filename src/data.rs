//! Report data files: TOML tables turned into models.
//!
//! Integers and floats become numbers, strings text, local dates dates and
//! booleans the text `TRUE`/`FALSE`. Attendance data carries its employees
//! as an `[[entities]]` array of tables next to the report parameters.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use reportline_core::{Model, ModelValue};
use std::path::Path;
use toml::{Table, Value};

use crate::config::AttendanceConfig;

const MAX_DATA_FILE_BYTES: u64 = 8 * 1_048_576;

pub const ENTITIES_KEY: &str = "entities";

/// Report parameters plus the prepared entity list of a paginated report.
#[derive(Clone, Debug, PartialEq)]
pub struct Roster {
    pub params: Model,
    pub entities: Vec<Model>,
}

pub fn read_table(path: &Path) -> Result<Table> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    if meta.len() > MAX_DATA_FILE_BYTES {
        bail!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_DATA_FILE_BYTES
        );
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    content
        .parse::<Table>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Flat model of every top-level key in `table`.
pub fn model_from_table(table: &Table) -> Result<Model> {
    let mut builder = Model::builder();
    for (key, value) in table {
        builder = builder.insert(key.as_str(), model_value(key, value)?);
    }
    Ok(builder.build())
}

/// Parameters and entities of an attendance list.
///
/// Only entities whose `filter_field` is `true` are kept, ordered
/// case-insensitively by `sort_field`.
pub fn roster_from_table(table: &Table, config: &AttendanceConfig) -> Result<Roster> {
    let mut params = Table::new();
    let mut entities: Vec<&Table> = Vec::new();
    for (key, value) in table {
        if key != ENTITIES_KEY {
            params.insert(key.clone(), value.clone());
            continue;
        }
        let Some(items) = value.as_array() else {
            bail!("'{}' must be an array of tables", ENTITIES_KEY);
        };
        for (index, item) in items.iter().enumerate() {
            match item.as_table() {
                Some(entity) => entities.push(entity),
                None => bail!("{}[{}] must be a table", ENTITIES_KEY, index),
            }
        }
    }

    let entities = prepare_roster(entities, config)
        .into_iter()
        .enumerate()
        .map(|(index, entity)| {
            model_from_table(entity).with_context(|| format!("in {}[{}]", ENTITIES_KEY, index))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Roster {
        params: model_from_table(&params)?,
        entities,
    })
}

fn prepare_roster<'a>(entities: Vec<&'a Table>, config: &AttendanceConfig) -> Vec<&'a Table> {
    let total = entities.len();
    let mut kept: Vec<&Table> = entities
        .into_iter()
        .filter(|entity| {
            entity
                .get(&config.filter_field)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .collect();
    kept.sort_by_cached_key(|entity| sort_key(entity.get(&config.sort_field)));
    log::debug!(
        "roster: kept {} of {} entities with {} = true",
        kept.len(),
        total,
        config.filter_field
    );
    kept
}

fn sort_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
        None => String::new(),
    }
}

fn model_value(key: &str, value: &Value) -> Result<ModelValue> {
    Ok(match value {
        Value::String(s) => ModelValue::Text(s.clone()),
        Value::Integer(i) => ModelValue::Number(*i as f64),
        Value::Float(f) => ModelValue::Number(*f),
        Value::Boolean(b) => ModelValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Datetime(dt) => match (dt.date, dt.time, dt.offset) {
            (Some(date), None, None) => {
                NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
                    .map(ModelValue::Date)
                    .with_context(|| format!("'{}' is not a valid date", key))?
            }
            _ => ModelValue::Text(dt.to_string()),
        },
        Value::Array(_) | Value::Table(_) => {
            bail!("'{}' must be a string, number, boolean or date", key)
        }
    })
}
