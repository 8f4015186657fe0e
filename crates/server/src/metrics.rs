// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local counters with Prometheus text exposition.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters served at `/metrics`.
#[derive(Debug, Default)]
pub struct Metrics {
    pub tool_calls: AtomicU64,
    pub tool_errors: AtomicU64,
    pub http_requests: AtomicU64,
    pub sse_clients: AtomicU64,
    /// Cumulative tool-call duration in microseconds (telemetry only).
    pub tool_call_micros: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tool_call(&self, success: bool, micros: Option<u64>) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.tool_errors.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(micros) = micros {
            self.tool_call_micros.fetch_add(micros, Ordering::Relaxed);
        }
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, help, value) in [
            ("masc_tool_calls_total", "Dispatched tool calls", &self.tool_calls),
            ("masc_tool_errors_total", "Tool calls that returned an error", &self.tool_errors),
            ("masc_http_requests_total", "HTTP requests accepted", &self.http_requests),
            ("masc_sse_clients", "Connected SSE subscribers", &self.sse_clients),
            (
                "masc_tool_call_micros_total",
                "Cumulative tool call duration in microseconds",
                &self.tool_call_micros,
            ),
        ] {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            ));
        }
        out
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
