//! Shared helpers for tests that run against a local mock of the API.

use httpmock::MockServer;
use pvlive::{ClientConfig, PvLive};
use serde_json::{Value, json};

pub fn client(server: &MockServer) -> PvLive {
    PvLive::with_config(ClientConfig {
        url: server.url("/pvlive/api/v4"),
        verify: true,
        timeout: None,
    })
    .unwrap()
}

pub const BASE_META: [&str; 3] = ["pes_id", "datetime_gmt", "generation_mw"];

/// Three national half-hours, newest first as the service returns them.
pub fn afternoon_rows() -> Value {
    json!({
        "data": [
            [0, "2018-07-03T13:30:00Z", 7311.25],
            [0, "2018-07-03T13:00:00Z", 7402.0],
            [0, "2018-07-03T12:30:00Z", 7388],
        ],
        "meta": BASE_META,
    })
}
