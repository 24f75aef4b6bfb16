//! Prometheus metrics for the Depot engine.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Registry holding every engine metric.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static CHUNKS_WRITTEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_chunks_written_total",
        "Total number of chunks written to the storage backend",
    )
    .expect("metric creation failed")
});

pub static CHUNKS_DEDUPLICATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_chunks_deduplicated_total",
        "Total number of chunk references satisfied by an existing chunk",
    )
    .expect("metric creation failed")
});

pub static BYTES_INGESTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_bytes_ingested_total",
        "Total bytes read from ingested streams",
    )
    .expect("metric creation failed")
});

pub static FILES_INGESTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_files_ingested_total",
        "Total number of new files committed",
    )
    .expect("metric creation failed")
});

pub static FILES_RETRIEVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_files_retrieved_total",
        "Total number of files reconstructed",
    )
    .expect("metric creation failed")
});

pub static INTEGRITY_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "depot_integrity_failures_total",
        "Total number of chunk or Merkle root verification failures",
    )
    .expect("metric creation failed")
});

static INIT: Once = Once::new();

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn init_metrics() {
    INIT.call_once(|| {
        for counter in [
            &*CHUNKS_WRITTEN,
            &*CHUNKS_DEDUPLICATED,
            &*BYTES_INGESTED,
            &*FILES_INGESTED,
            &*FILES_RETRIEVED,
            &*INTEGRITY_FAILURES,
        ] {
            REGISTRY
                .register(Box::new(counter.clone()))
                .expect("metric registration failed");
        }
    });
}

/// Encode every registered metric in the Prometheus text format.
pub fn gather() -> String {
    init_metrics();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
