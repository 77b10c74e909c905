//! Canonical page benchmarks
//!
//! Measures the merge and segment passes over book-sized documents, plus
//! the derivation cache key.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use canonical_pages::{
    CanonicalPageComputer, CanonicalPageRule, DerivationCache, ExtractionBox, NumeralType, Region,
    RegionDerivedPageNumber, SegmentFormatter,
};

/// Front matter in roman numerals, body read from two agreeing regions
fn book(page_count: u32) -> (Vec<Region>, Vec<CanonicalPageRule>, Vec<RegionDerivedPageNumber>) {
    let regions = vec![
        Region::page_number("footer", "Footer", ExtractionBox::new(280.0, 20.0, 330.0, 40.0)),
        Region::page_number("header", "Header", ExtractionBox::new(280.0, 750.0, 330.0, 770.0)),
    ];
    let rules = vec![
        CanonicalPageRule::negative("cover", 1, 2),
        CanonicalPageRule::positive("front", 3, 20, NumeralType::Roman, "i"),
    ];
    let readings = (21..=page_count)
        .flat_map(|page| {
            let value = (page - 20).to_string();
            [
                RegionDerivedPageNumber::new(page, value.clone(), "footer", "Footer"),
                RegionDerivedPageNumber::new(page, value, "header", "Header"),
            ]
        })
        .collect();
    (regions, rules, readings)
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute");

    for page_count in [100u32, 500, 2000] {
        let (regions, rules, readings) = book(page_count);
        group.bench_with_input(BenchmarkId::from_parameter(page_count), &page_count, |b, &n| {
            b.iter(|| {
                CanonicalPageComputer::compute(
                    black_box(n),
                    black_box(&regions),
                    black_box(&rules),
                    black_box(&readings),
                )
            })
        });
    }

    group.finish();
}

fn bench_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("segments");

    for page_count in [100u32, 500, 2000] {
        let (regions, rules, readings) = book(page_count);
        let map = CanonicalPageComputer::compute(page_count, &regions, &rules, &readings);
        group.bench_with_input(BenchmarkId::from_parameter(page_count), &map, |b, map| {
            b.iter(|| SegmentFormatter::format(black_box(map), &rules, &regions))
        });
    }

    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let (regions, _, _) = book(10);
    c.bench_function("cache_key", |b| {
        b.iter(|| DerivationCache::compute_key(black_box("project"), black_box(&regions)))
    });
}

criterion_group!(benches, bench_compute, bench_segments, bench_cache_key);
criterion_main!(benches);
