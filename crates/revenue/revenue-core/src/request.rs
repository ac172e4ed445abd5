//! Request keys and latest-request tracking
//!
//! Interactive callers re-run forecasts as inputs change. A [`RequestKey`]
//! is a content hash of the input and configuration; [`LatestRequest`]
//! cancels superseded background work and tells callers whether a result
//! still belongs to the newest request.

use crate::orchestrator::ForecastInput;
use revenue_api::{ForecastConfig, ForecastMethod, SmoothingParam};
use revenue_spi::{CancelHandle, Outcome};
use serde_json::Value;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Streaming 32-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
struct Fnv1a(u32);

impl Fnv1a {
    fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    fn write(&mut self, text: &str) {
        for byte in text.bytes() {
            self.0 ^= u32::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn field(&mut self, text: &str) {
        self.write(text);
        self.write("|");
    }
}

fn param_text(param: SmoothingParam) -> String {
    match param {
        SmoothingParam::Auto => "auto".to_string(),
        SmoothingParam::Fixed(value) => value.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Content-derived key for a forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey(u32);

impl RequestKey {
    /// Hash the configuration, then the input rows. Series rows contribute
    /// `period:total`; raw records contribute every field in key order, so
    /// any change that could alter aggregation changes the key.
    pub fn new(input: &ForecastInput, config: &ForecastConfig) -> Self {
        let holt = &config.holt;
        let mut hash = Fnv1a::new();
        hash.field(match config.method {
            ForecastMethod::Linear => "linear",
            ForecastMethod::Holt => "holt",
        });
        hash.field(&config.horizon.to_string());
        hash.field(&param_text(holt.alpha));
        hash.field(&param_text(holt.beta));
        hash.field(if holt.bootstrap { "b" } else { "n" });
        hash.field(&holt.bootstrap_samples.to_string());
        hash.field(if holt.bootstrap_async { "a" } else { "s" });
        hash.field(&format!("{:?}", holt.tuner));
        hash.field(&holt.seed.map_or_else(|| "-".to_string(), |s| s.to_string()));

        match input {
            ForecastInput::Series(points) => {
                hash.write(&points.len().to_string());
                for point in points {
                    hash.write("|");
                    hash.write(&point.period.to_string());
                    hash.write(":");
                    hash.write(&point.total.to_string());
                }
            }
            ForecastInput::Records(records) if !records.is_empty() => {
                hash.write(&records.len().to_string());
                for record in records {
                    hash.write("|");
                    for (field, value) in record.fields() {
                        hash.write(field);
                        hash.write("=");
                        hash.write(&value_text(value));
                        hash.write(";");
                    }
                }
            }
            ForecastInput::Records(_) => hash.write("0"),
        }

        Self(hash.0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[derive(Debug, Default)]
struct Latest {
    generation: u64,
    key: Option<RequestKey>,
    pending: CancelHandle,
}

/// Tracks the newest request so stale results can be discarded.
///
/// Each [`submit`](Self::submit) supersedes the previous request: its
/// pending computation is cancelled and the generation counter advances.
/// Callers check [`is_current`](Self::is_current) before using a result.
#[derive(Debug, Default)]
pub struct LatestRequest {
    inner: Mutex<Latest>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Latest> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether `key` is the request already in flight (or finished).
    pub fn is_duplicate(&self, key: RequestKey) -> bool {
        self.lock().key == Some(key)
    }

    /// Register a new request and its cancel handle. The previous request's
    /// computation is cancelled. Returns the new generation.
    pub fn submit(&self, key: RequestKey, pending: CancelHandle) -> u64 {
        let mut latest = self.lock();
        latest.pending.cancel();
        if latest.key != Some(key) {
            tracing::debug!(key = %key, "request key changed");
        }
        latest.generation += 1;
        latest.key = Some(key);
        latest.pending = pending;
        latest.generation
    }

    /// Register an outcome; returns it with its generation.
    pub fn track<T>(&self, key: RequestKey, outcome: Outcome<T>) -> (u64, Outcome<T>) {
        let generation = self.submit(key, outcome.cancel_handle());
        (generation, outcome)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn key(&self) -> Option<RequestKey> {
        self.lock().key
    }

    /// Cancel the latest request's computation, if still pending.
    pub fn cancel(&self) {
        self.lock().pending.cancel();
    }
}
