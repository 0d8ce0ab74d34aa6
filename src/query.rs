use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Kind of area a query is made for. Selects the URL path and the id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityType {
    /// Public Electricity Supply region. Id `0` is the national total.
    #[default]
    Pes,
    /// Grid Supply Point.
    Gsp,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Pes => "pes",
            EntityType::Gsp => "gsp",
        }
    }

    /// Name of the id column in responses and frames (`pes_id` / `gsp_id`).
    pub fn id_column(self) -> &'static str {
        match self {
            EntityType::Pes => "pes_id",
            EntityType::Gsp => "gsp_id",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pes" => Ok(EntityType::Pes),
            "gsp" => Ok(EntityType::Gsp),
            other => Err(Error::InvalidQuery(format!(
                "unknown entity type `{other}` (expected `pes` or `gsp`)"
            ))),
        }
    }
}

/// Sampling resolution of the returned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    FiveMinutes,
    #[default]
    HalfHour,
}

impl Period {
    pub fn minutes(self) -> u32 {
        match self {
            Period::FiveMinutes => 5,
            Period::HalfHour => 30,
        }
    }

    pub fn duration(self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.minutes()))
    }

    /// Length of one period in hours, used to turn MW into MWh.
    pub fn hours(self) -> f64 {
        f64::from(self.minutes()) / 60.0
    }
}

impl TryFrom<u32> for Period {
    type Error = Error;

    fn try_from(minutes: u32) -> Result<Self> {
        match minutes {
            5 => Ok(Period::FiveMinutes),
            30 => Ok(Period::HalfHour),
            other => Err(Error::InvalidQuery(format!(
                "unsupported period {other} (expected 5 or 30 minutes)"
            ))),
        }
    }
}

/// Optional statistical columns the service can add to each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraField {
    BiasError,
    CapacityMwp,
    InstalledCapacityMwp,
    LclMw,
    StatsError,
    UclMw,
    UncertaintyMw,
    SiteCount,
}

impl ExtraField {
    pub const ALL: [ExtraField; 8] = [
        ExtraField::BiasError,
        ExtraField::CapacityMwp,
        ExtraField::InstalledCapacityMwp,
        ExtraField::LclMw,
        ExtraField::StatsError,
        ExtraField::UclMw,
        ExtraField::UncertaintyMw,
        ExtraField::SiteCount,
    ];

    /// Wire name, as used in `extra_fields=` and in the response `meta`.
    pub fn name(self) -> &'static str {
        match self {
            ExtraField::BiasError => "bias_error",
            ExtraField::CapacityMwp => "capacity_mwp",
            ExtraField::InstalledCapacityMwp => "installedcapacity_mwp",
            ExtraField::LclMw => "lcl_mw",
            ExtraField::StatsError => "stats_error",
            ExtraField::UclMw => "ucl_mw",
            ExtraField::UncertaintyMw => "uncertainty_MW",
            ExtraField::SiteCount => "site_count",
        }
    }

    /// `site_count` is the only integer column; everything else is a float.
    pub fn is_integer(self) -> bool {
        matches!(self, ExtraField::SiteCount)
    }

    pub(crate) fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ExtraField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtraField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::UnknownExtraField(s.to_string()))
    }
}

/// Ordered, duplicate-free list of requested extra fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields(Vec<ExtraField>);

impl ExtraFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: ExtraField) {
        if !self.0.contains(&field) {
            self.0.push(field);
        }
    }

    pub fn contains(&self, field: ExtraField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ExtraField> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined wire form, e.g. `ucl_mw,lcl_mw`.
    pub fn to_param(&self) -> String {
        self.0.iter().map(|f| f.name()).collect::<Vec<_>>().join(",")
    }
}

impl FromStr for ExtraFields {
    type Err = Error;

    /// Parses `"ucl_mw, lcl_mw,,site_count"`. Empty items are skipped.
    fn from_str(s: &str) -> Result<Self> {
        let mut fields = ExtraFields::new();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            fields.push(item.parse()?);
        }
        Ok(fields)
    }
}

impl FromIterator<ExtraField> for ExtraFields {
    fn from_iter<I: IntoIterator<Item = ExtraField>>(iter: I) -> Self {
        let mut fields = ExtraFields::new();
        for f in iter {
            fields.push(f);
        }
        fields
    }
}

/// What to ask for: which entity, which extra columns, at what resolution.
///
/// The default targets the national aggregate (`pes`, id `0`) at 30 minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub entity_type: EntityType,
    pub entity_id: u32,
    pub extra_fields: ExtraFields,
    pub period: Period,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity_type: EntityType, entity_id: u32) -> Self {
        self.entity_type = entity_type;
        self.entity_id = entity_id;
        self
    }

    pub fn pes(self, entity_id: u32) -> Self {
        self.entity(EntityType::Pes, entity_id)
    }

    pub fn gsp(self, entity_id: u32) -> Self {
        self.entity(EntityType::Gsp, entity_id)
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn extra_fields(mut self, fields: ExtraFields) -> Self {
        self.extra_fields = fields;
        self
    }

    /// Parses a comma-separated list of extra field names.
    pub fn with_extra_fields(self, fields: &str) -> Result<Self> {
        Ok(self.extra_fields(fields.parse()?))
    }

    /// Path relative to the base url: `<entity_type>/<entity_id>`.
    pub(crate) fn path(&self) -> String {
        format!("{}/{}", self.entity_type, self.entity_id)
    }

    /// Query-string pairs for an optional `[start, end]` window.
    pub(crate) fn params(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<(&'static str, String)>> {
        let mut params = Vec::with_capacity(4);
        if let Some((start, end)) = window {
            if start > end {
                return Err(Error::InvalidRange {
                    start: iso_utc(&start),
                    end: iso_utc(&end),
                });
            }
            params.push(("start", iso_utc(&start)));
            params.push(("end", iso_utc(&end)));
        }
        if !self.extra_fields.is_empty() {
            params.push(("extra_fields", self.extra_fields.to_param()));
        }
        params.push(("period", self.period.minutes().to_string()));
        Ok(params)
    }
}

/// `2018-07-03T12:20:00Z`
pub(crate) fn iso_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
