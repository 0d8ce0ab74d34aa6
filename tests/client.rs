//! Operation-level tests against a local mock of the PV_Live API.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use httpmock::prelude::*;
use pvlive::{ClientConfig, Error, ExtraField, Period, PvLive, Query};
use serde_json::json;

use common::{BASE_META, afternoon_rows, client};

#[test]
fn latest_returns_a_three_field_tuple() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("period", "30");
        then.status(200).json_body(json!({
            "data": [[0, "2018-07-03T13:30:00Z", 7311.25]],
            "meta": BASE_META,
        }));
    });

    let record = client(&server).latest(&Query::new()).unwrap().unwrap();
    let (pes_id, datetime_gmt, generation_mw): (i64, String, f64) = record.tuple();
    assert_eq!(pes_id, 0);
    assert_eq!(datetime_gmt, "2018-07-03T13:30:00Z");
    assert_eq!(generation_mw, 7311.25);
    mock.assert();
}

#[test]
fn latest_picks_the_newest_row() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(200).json_body(afternoon_rows());
    });

    let record = client(&server).latest(&Query::new()).unwrap().unwrap();
    assert_eq!(record.tuple().1, "2018-07-03T13:30:00Z");
}

#[test]
fn latest_with_no_data_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(200).json_body(json!({"data": [], "meta": BASE_META}));
    });

    assert!(client(&server).latest(&Query::new()).unwrap().is_none());
}

#[test]
fn between_sends_iso_bounds_and_orders_rows() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("start", "2018-07-03T12:20:00Z")
            .query_param("end", "2018-07-03T14:00:00Z")
            .query_param("period", "30");
        then.status(200).json_body(afternoon_rows());
    });

    let rows = client(&server)
        .between(
            Utc.with_ymd_and_hms(2018, 7, 3, 12, 20, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 7, 3, 14, 0, 0).unwrap(),
            &Query::new(),
        )
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert!(
        rows.windows(2)
            .all(|w| w[0].datetime_gmt() <= w[1].datetime_gmt())
    );
    assert_eq!(rows[0].tuple().2, 7388.0);
    mock.assert();
}

#[test]
fn gsp_queries_use_gsp_path_and_column() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/gsp/120")
            .query_param("period", "5");
        then.status(200).json_body(json!({
            "data": [[120, "2018-07-03T12:05:00Z", 12.5]],
            "meta": ["gsp_id", "datetime_gmt", "generation_mw"],
        }));
    });

    let query = Query::new().gsp(120).period(Period::FiveMinutes);
    let rows = client(&server)
        .between(
            Utc.with_ymd_and_hms(2018, 7, 3, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 7, 3, 12, 5, 0).unwrap(),
            &query,
        )
        .unwrap();
    assert_eq!(rows[0].entity_id(), 120);
    mock.assert();
}

#[test]
fn at_time_queries_a_single_instant() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("start", "2018-06-03T12:30:00Z")
            .query_param("end", "2018-06-03T12:30:00Z");
        then.status(200).json_body(json!({
            "data": [[0, "2018-06-03T12:30:00Z", 8123.4]],
            "meta": BASE_META,
        }));
    });

    let at = Utc.with_ymd_and_hms(2018, 6, 3, 12, 30, 0).unwrap();
    let record = client(&server).at_time(at, &Query::new()).unwrap().unwrap();
    assert_eq!(record.datetime_gmt(), at);
    assert_eq!(record.generation_mw(), 8123.4);
    mock.assert();
}

#[test]
fn at_time_between_boundaries_keeps_the_covering_period() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("start", "2018-06-03T12:35:00Z")
            .query_param("end", "2018-06-03T12:35:00Z");
        then.status(200).json_body(json!({
            "data": [[0, "2018-06-03T12:30:00Z", 8123.4]],
            "meta": BASE_META,
        }));
    });

    let at = Utc.with_ymd_and_hms(2018, 6, 3, 12, 35, 0).unwrap();
    let record = client(&server)
        .at_time(at, &Query::new())
        .unwrap()
        .expect("row for 12:35");
    assert_eq!(
        record.tuple(),
        (0, "2018-06-03T12:30:00Z".to_string(), 8123.4)
    );
    mock.assert();
}

#[test]
fn day_peak_covers_the_whole_day() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("start", "2018-06-03T00:30:00Z")
            .query_param("end", "2018-06-04T00:00:00Z")
            .query_param("extra_fields", "ucl_mw,site_count");
        then.status(200).json_body(json!({
            "data": [
                [0, "2018-06-03T13:00:00Z", 8001.0, 8500.0, 2031],
                [0, "2018-06-03T12:30:00Z", 8123.4, 8600.0, 2031],
                [0, "2018-06-03T12:00:00Z", 7999.9, 8400.0, 2030],
            ],
            "meta": ["pes_id", "datetime_gmt", "generation_mw", "ucl_mw", "site_count"],
        }));
    });

    let query = Query::new().with_extra_fields("ucl_mw,site_count").unwrap();
    let peak = client(&server)
        .day_peak(NaiveDate::from_ymd_opt(2018, 6, 3).unwrap(), &query)
        .unwrap()
        .unwrap();
    assert_eq!(peak.tuple(), (0, "2018-06-03T12:30:00Z".to_string(), 8123.4));
    assert_eq!(peak.extra_f64(ExtraField::UclMw), Some(8600.0));
    assert_eq!(peak.site_count(), Some(2031));
    mock.assert();
}

#[test]
fn day_energy_integrates_half_hours() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/pvlive/api/v4/pes/0")
            .query_param("start", "2018-06-03T00:30:00Z");
        then.status(200).json_body(json!({
            "data": [
                [0, "2018-06-03T12:00:00Z", 1000.0],
                [0, "2018-06-03T12:30:00Z", 2000],
                [0, "2018-06-03T13:00:00Z", null],
            ],
            "meta": BASE_META,
        }));
    });

    let energy: f64 = client(&server)
        .day_energy(NaiveDate::from_ymd_opt(2018, 6, 3).unwrap(), &Query::new())
        .unwrap();
    assert_eq!(energy, 1500.0);
}

#[test]
fn server_errors_surface_as_status_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(503)
            .json_body(json!({"title": "Service Unavailable", "detail": "maintenance"}));
    });

    let err = client(&server).latest(&Query::new()).unwrap_err();
    match err {
        Error::Status { status, message, .. } => {
            assert_eq!(status.as_u16(), 503);
            assert!(message.contains("maintenance"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_payloads_are_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(200).body("{\"rows\": []}");
    });

    let err = client(&server).latest(&Query::new()).unwrap_err();
    assert!(matches!(err, Error::MalformedPayload(_)), "{err:?}");
}

#[test]
fn payload_without_data_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(200).json_body(json!({"meta": BASE_META}));
    });

    let err = client(&server).latest(&Query::new()).unwrap_err();
    assert!(matches!(err, Error::MalformedPayload(_)), "{err:?}");
}

#[test]
fn slow_responses_hit_the_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pvlive/api/v4/pes/0");
        then.status(200)
            .delay(std::time::Duration::from_secs(3))
            .json_body(afternoon_rows());
    });

    let client = client(&server).with_timeout(std::time::Duration::from_millis(200));
    let err = client.latest(&Query::new()).unwrap_err();
    match err {
        Error::Network { source, .. } => assert!(source.is_timeout(), "{source:?}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn url_is_the_configured_base() {
    let server = MockServer::start();
    let client = client(&server);
    assert_eq!(client.url(), server.url("/pvlive/api/v4"));
}

#[test]
fn invalid_ranges_never_reach_the_server() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200).json_body(afternoon_rows());
    });

    let err = client(&server)
        .between(
            Utc.with_ymd_and_hms(2018, 7, 3, 14, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 7, 3, 12, 0, 0).unwrap(),
            &Query::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
    assert_eq!(mock.hits(), 0);
}

#[test]
fn unknown_extra_fields_are_rejected() {
    let err = Query::new()
        .with_extra_fields("ucl_mw,not_a_field")
        .unwrap_err();
    assert!(matches!(err, Error::UnknownExtraField(ref f) if f == "not_a_field"));
}

#[test]
fn unreachable_service_is_a_network_error() {
    let client = PvLive::with_config(ClientConfig {
        url: "http://127.0.0.1:9/pvlive/api/v4".to_string(),
        verify: true,
        timeout: Some(std::time::Duration::from_secs(5)),
    })
    .unwrap();

    let err = client.latest(&Query::new()).unwrap_err();
    assert!(matches!(err, Error::Network { .. }), "{err:?}");
}

#[cfg(feature = "dataframe")]
mod frames {
    use super::*;
    use pvlive::polars::prelude::{DataType, TimeUnit};

    fn column_names(df: &pvlive::polars::prelude::DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn between_frame_has_typed_required_columns() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pvlive/api/v4/pes/0");
            then.status(200).json_body(afternoon_rows());
        });

        let df = client(&server)
            .between_frame(
                Utc.with_ymd_and_hms(2018, 7, 3, 12, 20, 0).unwrap(),
                Utc.with_ymd_and_hms(2018, 7, 3, 14, 0, 0).unwrap(),
                &Query::new(),
            )
            .unwrap();

        assert_eq!(column_names(&df), ["pes_id", "datetime_gmt", "generation_mw"]);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("pes_id").unwrap().dtype(), &DataType::Int64);
        assert!(matches!(
            df.column("datetime_gmt").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, _)
        ));
        assert_eq!(df.column("generation_mw").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn extra_fields_add_exactly_those_columns() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/pvlive/api/v4/pes/0")
                .query_param(
                    "extra_fields",
                    "ucl_mw,lcl_mw,installedcapacity_mwp,stats_error",
                );
            then.status(200).json_body(json!({
                "data": [[0, "2018-06-03T12:30:00Z", 8100.0, 8600.0, 7600.0, 12800.5, 3.2, 1.5]],
                "meta": [
                    "pes_id", "datetime_gmt", "generation_mw", "ucl_mw", "lcl_mw",
                    "installedcapacity_mwp", "stats_error", "bias_error"
                ],
            }));
        });

        let query = Query::new()
            .with_extra_fields("ucl_mw,lcl_mw,installedcapacity_mwp,stats_error")
            .unwrap();
        let at = Utc.with_ymd_and_hms(2018, 6, 3, 12, 35, 0).unwrap();
        let df = client(&server).at_time_frame(at, &query).unwrap();

        assert_eq!(
            column_names(&df),
            [
                "pes_id",
                "datetime_gmt",
                "generation_mw",
                "ucl_mw",
                "lcl_mw",
                "installedcapacity_mwp",
                "stats_error"
            ]
        );
        assert_eq!(df.height(), 1);
        for name in ["ucl_mw", "lcl_mw", "installedcapacity_mwp", "stats_error"] {
            assert_eq!(df.column(name).unwrap().dtype(), &DataType::Float64, "{name}");
        }
    }

    #[test]
    fn latest_frame_has_one_row_per_entity() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pvlive/api/v4/pes/0");
            then.status(200).json_body(afternoon_rows());
        });

        let df = client(&server).latest_frame(&Query::new()).unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn empty_day_peak_frame_keeps_schema() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pvlive/api/v4/pes/0");
            then.status(200).json_body(json!({"data": [], "meta": BASE_META}));
        });

        let query = Query::new().with_extra_fields("site_count").unwrap();
        let df = client(&server)
            .day_peak_frame(NaiveDate::from_ymd_opt(2018, 6, 3).unwrap(), &query)
            .unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.column("site_count").unwrap().dtype(), &DataType::Int64);
    }
}
