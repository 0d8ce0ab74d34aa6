use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use crate::config::load_config;
use crate::error::{Error, Result, format_api_error};
use crate::payload::ApiPayload;
use crate::query::Query;
use crate::record::{Record, latest_per_entity, peak_per_entity, records_from_payload};
use crate::util::{day_window, urljoin};

#[cfg(feature = "dataframe")]
use crate::frame::records_to_frame;
#[cfg(feature = "dataframe")]
use polars::prelude::DataFrame;

/// Public PV_Live API, version 4.
pub const DEFAULT_URL: &str = "https://api.pvlive.uk/pvlive/api/v4";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically [`DEFAULT_URL`].
    pub url: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Per-request timeout; 60 seconds when unset.
    pub timeout: Option<Duration>,
}

/// Blocking client for the PV_Live API.
///
/// Every operation issues exactly one GET request and maps the response.
/// Nothing is cached or retried.
#[derive(Debug, Clone)]
pub struct PvLive {
    url: String,
    timeout: Duration,
    http: HttpClient,
}

impl PvLive {
    /// Creates a client from `PVLIVE_URL` / `.pvliverc`, falling back to
    /// [`DEFAULT_URL`].
    ///
    /// This is equivalent to `PvLive::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variables `PVLIVE_URL` / `PVLIVE_VERIFY`
    /// - config file from `PVLIVE_RC` or `.pvliverc`
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        Self::with_config(load_config(url, verify)?)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pvlive-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("pvlive-rs")),
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);
        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(Error::HttpClient)?;

        Ok(Self {
            url: cfg.url,
            timeout: cfg.timeout.unwrap_or(DEFAULT_TIMEOUT),
            http,
        })
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL every request is built from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Most recent estimate for the queried entity.
    ///
    /// ```no_run
    /// use pvlive::{PvLive, Query};
    ///
    /// let client = PvLive::from_env()?;
    /// if let Some(record) = client.latest(&Query::new())? {
    ///     let (pes_id, datetime_gmt, generation_mw) = record.tuple();
    ///     println!("{pes_id} {datetime_gmt} {generation_mw} MW");
    /// }
    /// # Ok::<(), pvlive::Error>(())
    /// ```
    pub fn latest(&self, query: &Query) -> Result<Option<Record>> {
        Ok(self.latest_records(query)?.into_iter().next())
    }

    /// Estimate the service reports for the instant `at` (queried as
    /// `start=end=at`). `None` when it has no row for it.
    pub fn at_time(&self, at: DateTime<Utc>, query: &Query) -> Result<Option<Record>> {
        Ok(self.at_time_records(at, query)?.into_iter().next())
    }

    /// All estimates in `[start, end]`, ordered by time.
    pub fn between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        query: &Query,
    ) -> Result<Vec<Record>> {
        self.fetch(query, Some((start, end)))
    }

    /// Highest estimate of the UTC day `d`.
    pub fn day_peak(&self, d: NaiveDate, query: &Query) -> Result<Option<Record>> {
        Ok(self.day_peak_records(d, query)?.into_iter().next())
    }

    /// Energy generated on the UTC day `d`, in MWh.
    ///
    /// Missing periods contribute nothing; an empty day yields `0.0`.
    pub fn day_energy(&self, d: NaiveDate, query: &Query) -> Result<f64> {
        let (start, end) = day_window(d, query.period)?;
        let records = self.fetch(query, Some((start, end)))?;
        let mw_total: f64 = records
            .iter()
            .map(Record::generation_mw)
            .filter(|v| !v.is_nan())
            .sum();
        Ok(mw_total * query.period.hours())
    }

    #[cfg(feature = "dataframe")]
    pub fn latest_frame(&self, query: &Query) -> Result<DataFrame> {
        self.frame(&self.latest_records(query)?, query)
    }

    #[cfg(feature = "dataframe")]
    pub fn at_time_frame(&self, at: DateTime<Utc>, query: &Query) -> Result<DataFrame> {
        self.frame(&self.at_time_records(at, query)?, query)
    }

    #[cfg(feature = "dataframe")]
    pub fn between_frame(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        query: &Query,
    ) -> Result<DataFrame> {
        self.frame(&self.between(start, end, query)?, query)
    }

    #[cfg(feature = "dataframe")]
    pub fn day_peak_frame(&self, d: NaiveDate, query: &Query) -> Result<DataFrame> {
        self.frame(&self.day_peak_records(d, query)?, query)
    }

    #[cfg(feature = "dataframe")]
    fn frame(&self, records: &[Record], query: &Query) -> Result<DataFrame> {
        records_to_frame(records, query.entity_type, &query.extra_fields)
    }

    fn latest_records(&self, query: &Query) -> Result<Vec<Record>> {
        Ok(latest_per_entity(self.fetch(query, None)?))
    }

    // The service answers `start=end=at` with the period covering `at`, which
    // is stamped with the period end and need not equal `at`.
    fn at_time_records(&self, at: DateTime<Utc>, query: &Query) -> Result<Vec<Record>> {
        Ok(latest_per_entity(self.fetch(query, Some((at, at)))?))
    }

    fn day_peak_records(&self, d: NaiveDate, query: &Query) -> Result<Vec<Record>> {
        let (start, end) = day_window(d, query.period)?;
        Ok(peak_per_entity(self.fetch(query, Some((start, end)))?))
    }

    fn fetch(
        &self,
        query: &Query,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Record>> {
        let params = query.params(window)?;
        let url = urljoin(&self.url, &query.path());
        let payload = self.api_json(&url, &params)?;
        records_from_payload(&payload, query.entity_type, &query.extra_fields)
    }

    fn api_json(&self, url: &str, params: &[(&'static str, String)]) -> Result<ApiPayload> {
        tracing::debug!(url, ?params, "querying PV_Live");

        let network = |source: reqwest::Error| Error::Network {
            url: url.to_string(),
            source,
        };
        let resp = self
            .http
            .get(url)
            .query(params)
            .timeout(self.timeout)
            .send()
            .map_err(network)?;

        let status = resp.status();
        let text = resp.text().map_err(network)?;
        if !status.is_success() {
            return Err(format_api_error(status, url, &text));
        }

        let payload = ApiPayload::parse(&text)?;
        tracing::debug!(url, %status, rows = payload.data.len(), "PV_Live response");
        Ok(payload)
    }
}
