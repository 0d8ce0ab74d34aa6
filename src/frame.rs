//! Polars output for query results.

use polars::prelude::{Column, DataFrame, Int64Chunked, IntoSeries, TimeUnit};

use crate::error::Result;
use crate::query::{EntityType, ExtraFields};
use crate::record::{ExtraValue, Record};

/// Builds a typed frame from records.
///
/// Columns: `<entity>_id` (Int64), `datetime_gmt` (Datetime[ms, UTC]),
/// `generation_mw` (Float64), then one column per requested extra field in
/// request order. The schema is the same when `records` is empty.
pub(crate) fn records_to_frame(
    records: &[Record],
    entity_type: EntityType,
    extra_fields: &ExtraFields,
) -> Result<DataFrame> {
    let ids: Vec<i64> = records.iter().map(Record::entity_id).collect();
    let times: Vec<i64> = records
        .iter()
        .map(|r| r.datetime_gmt().timestamp_millis())
        .collect();
    let generation: Vec<Option<f64>> = records
        .iter()
        .map(|r| Some(r.generation_mw()).filter(|v| !v.is_nan()))
        .collect();

    let mut columns = Vec::with_capacity(3 + extra_fields.len());
    columns.push(Column::new(entity_type.id_column().into(), ids));
    columns.push(
        Int64Chunked::from_vec("datetime_gmt".into(), times)
            .into_datetime(TimeUnit::Milliseconds, Some("UTC".into()))
            .into_series()
            .into(),
    );
    columns.push(Column::new("generation_mw".into(), generation));

    for field in extra_fields.iter() {
        let column = if field.is_integer() {
            let values: Vec<Option<i64>> = records
                .iter()
                .map(|r| r.extra(field).and_then(ExtraValue::as_i64))
                .collect();
            Column::new(field.name().into(), values)
        } else {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.extra_f64(field)).collect();
            Column::new(field.name().into(), values)
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}
