use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::payload::ApiPayload;
use crate::query::{EntityType, ExtraField, ExtraFields, iso_utc};

/// Value of one extra field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtraValue {
    Float(f64),
    Integer(i64),
}

impl ExtraValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ExtraValue::Float(v) => v,
            ExtraValue::Integer(v) => v as f64,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            ExtraValue::Integer(v) => Some(v),
            ExtraValue::Float(_) => None,
        }
    }
}

/// One generation estimate for one entity at one point in time.
///
/// Only the extra fields that were requested are present; each one may still
/// be `None` when the service had no value for that row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity_id: i64,
    datetime_gmt: DateTime<Utc>,
    generation_mw: f64,
    extras: Vec<(ExtraField, Option<ExtraValue>)>,
}

impl Record {
    /// `pes_id` or `gsp_id`, depending on the query.
    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    /// End of the half-hour (or five-minute) period, in UTC.
    pub fn datetime_gmt(&self) -> DateTime<Utc> {
        self.datetime_gmt
    }

    /// Estimated generation in MW. `NaN` when the service returned `null`.
    pub fn generation_mw(&self) -> f64 {
        self.generation_mw
    }

    /// `(entity id, ISO 8601 timestamp, generation)`.
    pub fn tuple(&self) -> (i64, String, f64) {
        (
            self.entity_id,
            iso_utc(&self.datetime_gmt),
            self.generation_mw,
        )
    }

    /// Whether `field` was requested for this record.
    pub fn has_extra(&self, field: ExtraField) -> bool {
        self.extras.iter().any(|(f, _)| *f == field)
    }

    pub fn extra(&self, field: ExtraField) -> Option<ExtraValue> {
        self.extras
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, v)| *v)
    }

    pub fn extra_f64(&self, field: ExtraField) -> Option<f64> {
        self.extra(field).map(ExtraValue::as_f64)
    }

    pub fn site_count(&self) -> Option<i64> {
        self.extra(ExtraField::SiteCount).and_then(ExtraValue::as_i64)
    }

    /// Requested extra fields in request order.
    pub fn extras(&self) -> impl Iterator<Item = (ExtraField, Option<ExtraValue>)> + '_ {
        self.extras.iter().copied()
    }
}

/// Maps response rows onto records, ordered by timestamp then entity id.
pub(crate) fn records_from_payload(
    payload: &ApiPayload,
    entity_type: EntityType,
    extra_fields: &ExtraFields,
) -> Result<Vec<Record>> {
    let id_col = payload.require_column(entity_type.id_column())?;
    let dt_col = payload.require_column("datetime_gmt")?;
    let gen_col = payload.require_column("generation_mw")?;
    let extra_cols: Vec<(ExtraField, Option<usize>)> = extra_fields
        .iter()
        .map(|f| (f, payload.column(f.name())))
        .collect();

    let missing = missing_extra_fields(&extra_cols);
    if !missing.is_empty() {
        tracing::warn!(
            fields = %missing.join(","),
            "requested extra fields missing from response"
        );
    }

    let mut records = Vec::with_capacity(payload.data.len());
    for (i, row) in payload.data.iter().enumerate() {
        if row.len() != payload.meta.len() {
            return Err(Error::MalformedPayload(format!(
                "row {} has {} value(s), expected {}",
                i,
                row.len(),
                payload.meta.len()
            )));
        }

        let entity_id = as_integer(&row[id_col])
            .ok_or_else(|| bad_value(i, entity_type.id_column(), &row[id_col]))?;
        let datetime_gmt = parse_timestamp(&row[dt_col])
            .ok_or_else(|| bad_value(i, "datetime_gmt", &row[dt_col]))?;
        let generation_mw = match &row[gen_col] {
            Value::Null => f64::NAN,
            v => v
                .as_f64()
                .ok_or_else(|| bad_value(i, "generation_mw", v))?,
        };

        let mut extras = Vec::with_capacity(extra_cols.len());
        for (field, col) in &extra_cols {
            let value = match col.map(|c| &row[c]) {
                None | Some(Value::Null) => None,
                Some(v) if field.is_integer() => Some(ExtraValue::Integer(
                    as_integer(v).ok_or_else(|| bad_value(i, field.name(), v))?,
                )),
                Some(v) => Some(ExtraValue::Float(
                    v.as_f64().ok_or_else(|| bad_value(i, field.name(), v))?,
                )),
            };
            extras.push((*field, value));
        }

        records.push(Record {
            entity_id,
            datetime_gmt,
            generation_mw,
            extras,
        });
    }

    records.sort_by(|a, b| {
        a.datetime_gmt
            .cmp(&b.datetime_gmt)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    Ok(records)
}

/// Most recent record of each entity, ordered by entity id.
pub(crate) fn latest_per_entity(records: Vec<Record>) -> Vec<Record> {
    pick_per_entity(records, |candidate, current| {
        candidate.datetime_gmt > current.datetime_gmt
    })
}

/// Highest-generation record of each entity, ordered by entity id.
///
/// Ties keep the earliest period; `NaN` never wins.
pub(crate) fn peak_per_entity(records: Vec<Record>) -> Vec<Record> {
    pick_per_entity(records, |candidate, current| {
        (current.generation_mw.is_nan() && !candidate.generation_mw.is_nan())
            || candidate.generation_mw > current.generation_mw
    })
}

fn pick_per_entity(
    records: Vec<Record>,
    better: impl Fn(&Record, &Record) -> bool,
) -> Vec<Record> {
    let mut best: BTreeMap<i64, Record> = BTreeMap::new();
    for record in records {
        let replace = best
            .get(&record.entity_id)
            .is_none_or(|current| better(&record, current));
        if replace {
            best.insert(record.entity_id, record);
        }
    }
    best.into_values().collect()
}

fn missing_extra_fields(extra_cols: &[(ExtraField, Option<usize>)]) -> Vec<&'static str> {
    extra_cols
        .iter()
        .filter(|(_, col)| col.is_none())
        .map(|(field, _)| field.name())
        .collect()
}

fn bad_value(row: usize, column: &str, value: &Value) -> Error {
    Error::MalformedPayload(format!(
        "row {row}: unexpected value {value} in column `{column}`"
    ))
}

fn as_integer(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    // Integers occasionally arrive as `12.0`.
    v.as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive timestamps are GMT.
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
