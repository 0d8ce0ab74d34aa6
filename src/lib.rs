//! A small Rust client for the Sheffield Solar PV_Live API.
//!
//! PV_Live publishes estimates of solar PV generation across Great Britain,
//! nationally (PES region `0`), per PES region and per Grid Supply Point.
//! Each call issues one GET request and maps the `data`/`meta` payload onto
//! [`Record`]s, or onto a typed Polars `DataFrame` with the `dataframe`
//! feature (enabled by default).
//!
//! ## Quick start
//! - No credentials are needed. The base URL defaults to [`DEFAULT_URL`] and can be
//!   overridden with `PVLIVE_URL` or a `.pvliverc` file (current directory or home).
//! - Build a [`Query`] and call one of [`PvLive::latest`], [`PvLive::at_time`],
//!   [`PvLive::between`], [`PvLive::day_peak`] or [`PvLive::day_energy`].
//!
//! ```no_run
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use pvlive::{PvLive, Query};
//!
//! fn main() -> Result<(), pvlive::Error> {
//!     let client = PvLive::from_env()?;
//!     let national = Query::new().with_extra_fields("installedcapacity_mwp,ucl_mw")?;
//!
//!     let rows = client.between(
//!         Utc.with_ymd_and_hms(2018, 7, 3, 12, 20, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2018, 7, 3, 14, 0, 0).unwrap(),
//!         &national,
//!     )?;
//!     for row in &rows {
//!         println!("{:?}", row.tuple());
//!     }
//!
//!     let energy = client.day_energy(NaiveDate::from_ymd_opt(2018, 6, 3).unwrap(), &Query::new())?;
//!     println!("{energy:.1} MWh");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
#[cfg(feature = "dataframe")]
mod frame;
mod payload;
mod query;
mod record;
mod util;

pub use client::{ClientConfig, DEFAULT_URL, PvLive};
pub use error::{Error, Result};
pub use query::{EntityType, ExtraField, ExtraFields, Period, Query};
pub use record::{ExtraValue, Record};

#[cfg(feature = "dataframe")]
pub use polars;
