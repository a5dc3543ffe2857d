//! Channel lifecycle metrics.
//!
//! # Metrics
//! - `channel_creations_total` (counter): channels produced by the factory
//! - `channel_creation_failures_total` (counter): endpoint-unreachable factory failures
//! - `channel_disposals_total` (counter): channels torn down
//! - `channel_faults_total` (counter): transport faults seen by operations, by category
//! - `operation_escalations_total` (counter): faults that recurred after recreation
//! - `channel_generation` (gauge): latest channel generation

pub fn record_channel_created(generation: u64) {
    ::metrics::counter!("channel_creations_total").increment(1);
    ::metrics::gauge!("channel_generation").set(generation as f64);
}

pub fn record_creation_failure() {
    ::metrics::counter!("channel_creation_failures_total").increment(1);
}

pub fn record_channel_disposed() {
    ::metrics::counter!("channel_disposals_total").increment(1);
}

pub fn record_fault(category: &str) {
    ::metrics::counter!("channel_faults_total", "category" => category.to_string()).increment(1);
}

pub fn record_escalation() {
    ::metrics::counter!("operation_escalations_total").increment(1);
}
