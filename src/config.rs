use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_URL};
use crate::error::{Error, Result};

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    verify: Option<bool>,
    timeout: Option<Duration>,
}

pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let url = url.or_else(|| std::env::var("PVLIVE_URL").ok());
    let verify = match verify {
        Some(v) => Some(v),
        None => std::env::var("PVLIVE_VERIFY")
            .ok()
            .map(|v| parse_bool(&v))
            .transpose()
            .map_err(|e| Error::Config(format!("PVLIVE_VERIFY: {e:#}")))?,
    };
    resolve(url, verify, &rc_candidates())
}

/// Fills whatever `url`/`verify` leave open from the first rc file in
/// `rc_paths` that exists.
fn resolve(
    url: Option<String>,
    verify: Option<bool>,
    rc_paths: &[PathBuf],
) -> Result<ClientConfig> {
    let mut file_cfg = RcConfig::default();
    for rc_path in rc_paths {
        if rc_path.exists() {
            file_cfg = read_rc(rc_path).map_err(|e| Error::Config(format!("{e:#}")))?;
            tracing::debug!(path = %rc_path.display(), "loaded PV_Live configuration file");
            break;
        }
    }

    let url = url
        .or(file_cfg.url)
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "url must start with http:// or https:// (got `{url}`)"
        )));
    }

    Ok(ClientConfig {
        url,
        verify: verify.or(file_cfg.verify).unwrap_or(true),
        timeout: file_cfg.timeout,
    })
}

fn read_rc(path: &Path) -> anyhow::Result<RcConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    parse_rc(&text).with_context(|| format!("invalid configuration file {}", path.display()))
}

fn parse_rc(text: &str) -> anyhow::Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // `url:` may be on one line and its value on the next.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            let v = strip_quotes(line);
            if !line.contains(':') || v.starts_with("http") {
                set_value(&mut cfg, pk, v)?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                set_value(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn set_value(cfg: &mut RcConfig, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "verify" => cfg.verify = Some(parse_bool(value)?),
        "timeout" => {
            let secs: f64 = value
                .parse()
                .with_context(|| format!("timeout must be a number of seconds (got `{value}`)"))?;
            if !secs.is_finite() || secs <= 0.0 {
                bail!("timeout must be positive (got `{value}`)");
            }
            cfg.timeout = Some(Duration::from_secs_f64(secs));
        }
        other => tracing::warn!(key = other, "ignoring unknown configuration key"),
    }
    Ok(())
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got `{other}`"),
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // PVLIVE_RC, then ./.pvliverc, then ~/.pvliverc
    if let Ok(p) = std::env::var("PVLIVE_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".pvliverc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".pvliverc"));
    }
    v
}
