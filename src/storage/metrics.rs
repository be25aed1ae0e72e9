//! Shared metrics recording for table stores.

use std::time::Instant;

/// Records operation metrics for a store call.
///
/// This function records two metrics for each operation:
/// 1. `store_operations_total` - Counter for operation count by status
/// 2. `store_operation_duration_ms` - Histogram for operation latency
///
/// # Arguments
///
/// * `backend` - Backend name (e.g., "sqlite", "postgresql")
/// * `operation` - Operation name (e.g., "`table_exists`", "transaction")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "store_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "store_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Runs `f` and records its outcome.
pub fn timed<T, E>(
    backend: &'static str,
    operation: &'static str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = f();
    let status = if result.is_ok() { "success" } else { "error" };
    record_operation_metrics(backend, operation, start, status);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder() {
        // No global recorder installed; recording must be a no-op.
        record_operation_metrics("sqlite", "execute", Instant::now(), "success");
    }

    #[test]
    fn test_timed_passes_result_through() {
        let ok: Result<u8, String> = timed("sqlite", "execute", || Ok(7));
        assert_eq!(ok, Ok(7));
        let err: Result<u8, String> = timed("sqlite", "execute", || Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }
}
