//! Benchmark tests for critical store operations
//!
//! Run with: cargo test --release -- --ignored --nocapture bench

use std::time::Instant;

use chrono::Utc;
use tinylink::store::MemoryStore;

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_create_links() {
    println!("\n=== Benchmark: Create links ===\n");

    let store = MemoryStore::new();
    let now = Utc::now();

    benchmark("Create owned link", 10_000, || {
        store.create_link("https://example.com/bench", Some("benchUser"), now);
    });
}

#[test]
#[ignore]
fn bench_redirect_traversals() {
    println!("\n=== Benchmark: Redirect traversals ===\n");

    let store = MemoryStore::new();
    let now = Utc::now();
    let link = store.create_link("https://example.com/bench", Some("benchUser"), now);

    // Repeat visits by an already-counted session: the hot path.
    benchmark("Repeat visit", 10_000, || {
        store.record_visit(&link.code, false, now);
    });

    // Unique visits also allocate a visitor id and grow the audit trail.
    benchmark("Unique visit", 10_000, || {
        store.record_visit(&link.code, true, now);
    });
}

#[test]
#[ignore]
fn bench_owner_scans() {
    println!("\n=== Benchmark: Owner scans ===\n");

    let store = MemoryStore::new();
    let now = Utc::now();
    for i in 0..1_000 {
        let owner = if i % 10 == 0 { "benchUser" } else { "someoneElse" };
        store.create_link("https://example.com/bench", Some(owner), now);
    }

    benchmark("links_for_owner over 1k links", 1_000, || {
        let links = store.links_for_owner("benchUser");
        assert_eq!(links.len(), 100);
    });
}
