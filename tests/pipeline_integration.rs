//! Pipeline integration tests
//!
//! Extraction through the cache into the canonical map and segments.

use std::sync::Arc;

use canonical_pages::{
    CancelToken, CanonicalPageComputer, CanonicalPageRule, DerivationCache, ExtractionBox,
    FragmentTextSource, JsonFileStore, MapStatus, NumeralType, PageColor, PageNumberExtractor,
    PageSource, PageSpan, Region, RegionDerivedPageNumber, SegmentFormatter, TextFragment,
};

fn footer() -> ExtractionBox {
    ExtractionBox::new(280.0, 20.0, 330.0, 40.0)
}

fn numbered(pages: &[(u32, &str)], page_count: u32) -> FragmentTextSource {
    pages
        .iter()
        .fold(FragmentTextSource::new(page_count), |source, (page, text)| {
            source.with_fragment(*page, TextFragment::new(*text, 300.0, 25.0, 10.0, 8.0))
        })
}

#[tokio::test]
async fn test_end_to_end_rule_and_region() {
    let rules = vec![CanonicalPageRule::positive("r1", 1, 1, NumeralType::Roman, "i")];
    let regions = vec![Region::page_number("R", "Footer", footer()).on_range("2-3")];
    let source = numbered(&[(1, "ignored"), (2, "2"), (3, "3")], 3);

    let readings = PageNumberExtractor::default()
        .extract(&regions, 3, &source, &CancelToken::new())
        .await
        .unwrap()
        .into_readings()
        .unwrap();
    assert_eq!(
        readings,
        vec![
            RegionDerivedPageNumber::new(2, "2", "R", "Footer"),
            RegionDerivedPageNumber::new(3, "3", "R", "Footer"),
        ]
    );

    let map = CanonicalPageComputer::compute(3, &regions, &rules, &readings);
    assert_eq!(map.status(), MapStatus::Resolved);
    assert_eq!(map.canonical_page(1), Some("i"));
    assert_eq!(map.get(1).unwrap().source, PageSource::RulePositive);
    assert_eq!(map.canonical_page(2), Some("2"));
    assert_eq!(map.get(2).unwrap().source, PageSource::Region);
    assert_eq!(map.canonical_page(3), Some("3"));
    assert_eq!(map.get(3).unwrap().source, PageSource::Region);

    let segments = SegmentFormatter::format(&map, &rules, &regions);
    assert_eq!(segments.len(), 2);

    assert_eq!(segments[0].document_page_range, PageSpan::new(1, 1));
    assert_eq!(
        segments[0].canonical_page_range,
        PageSpan::new("i".to_string(), "i".to_string())
    );
    assert_eq!(segments[0].color, PageColor::Blue);

    assert_eq!(segments[1].document_page_range, PageSpan::new(2, 3));
    assert_eq!(
        segments[1].canonical_page_range,
        PageSpan::new("2".to_string(), "3".to_string())
    );
    assert_eq!(segments[1].color, PageColor::Green);
    assert_eq!(segments[1].region_names, vec!["Footer".to_string()]);
}

#[tokio::test]
async fn test_two_regions_disagree() {
    let regions = vec![
        Region::page_number("a", "Footer", footer()),
        Region::page_number("b", "Header", ExtractionBox::new(280.0, 750.0, 330.0, 770.0)),
    ];
    let source = FragmentTextSource::new(5)
        .with_fragment(4, TextFragment::new("iv", 300.0, 25.0, 10.0, 8.0))
        .with_fragment(5, TextFragment::new("iv", 300.0, 25.0, 10.0, 8.0))
        .with_fragment(5, TextFragment::new("v", 300.0, 755.0, 10.0, 8.0));

    let readings = PageNumberExtractor::default()
        .extract(&regions, 5, &source, &CancelToken::new())
        .await
        .unwrap()
        .into_readings()
        .unwrap();

    let map = CanonicalPageComputer::compute(5, &regions, &[], &readings);
    assert!(map.get(5).is_none());
    assert!(map.is_conflict(5));
    assert_eq!(map.canonical_page(4), Some("iv"));
    assert_eq!(map.statistics().conflict_pages, 1);

    // A rule over the conflicting page resolves it
    let rules = vec![CanonicalPageRule::positive("fix", 5, 5, NumeralType::Roman, "v")];
    let map = CanonicalPageComputer::compute(5, &regions, &rules, &readings);
    assert_eq!(map.get(5).unwrap().source, PageSource::RulePositive);
    assert!(!map.is_conflict(5));
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let regions = vec![Region::page_number("r1", "Footer", footer())];
    let source = numbered(&[(1, "1"), (2, "2")], 2);

    let first = {
        let cache = DerivationCache::new(Arc::new(JsonFileStore::new(dir.path()).unwrap()));
        PageNumberExtractor::default()
            .derive("p1", &regions, 2, &source, Some(&cache), &CancelToken::new())
            .await
            .unwrap()
    };

    // Text is gone; only the cache can produce readings now
    let empty = FragmentTextSource::new(2);
    let cache = DerivationCache::new(Arc::new(JsonFileStore::new(dir.path()).unwrap()));
    let second = PageNumberExtractor::default()
        .derive("p1", &regions, 2, &empty, Some(&cache), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(first, second);

    // Moving the box invalidates the entry
    let moved = vec![Region::page_number("r1", "Footer", ExtractionBox::new(0.0, 0.0, 10.0, 10.0))];
    let third = PageNumberExtractor::default()
        .derive("p1", &moved, 2, &empty, Some(&cache), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(third.readings().map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn test_corrupt_cache_file_recomputes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("region-page-numbers-p1.json"), "not json").unwrap();

    let regions = vec![Region::page_number("r1", "Footer", footer())];
    let source = numbered(&[(1, "7")], 1);
    let cache = DerivationCache::new(Arc::new(JsonFileStore::new(dir.path()).unwrap()));

    let readings = PageNumberExtractor::default()
        .derive("p1", &regions, 1, &source, Some(&cache), &CancelToken::new())
        .await
        .unwrap()
        .into_readings()
        .unwrap();
    assert_eq!(readings, vec![RegionDerivedPageNumber::new(1, "7", "r1", "Footer")]);

    let key = DerivationCache::compute_key("p1", &regions);
    assert_eq!(cache.lookup("p1", &key), Some(readings));
}

#[test]
fn test_front_matter_body_and_ignored_pages() {
    let rules = vec![
        CanonicalPageRule::negative("cover", 1, 2).with_label("Cover"),
        CanonicalPageRule::positive("front", 3, 12, NumeralType::Roman, "i"),
    ];
    let readings: Vec<RegionDerivedPageNumber> = (13..=20)
        .map(|page| RegionDerivedPageNumber::new(page, (page - 12).to_string(), "r1", "Footer"))
        .collect();

    let map = CanonicalPageComputer::compute(22, &[], &rules, &readings);
    let segments = SegmentFormatter::format(&map, &rules, &[]);
    assert_eq!(
        SegmentFormatter::display(&segments),
        "1-2 ⚪ (ignored)  i-x 🔵  1-8 🟢  21-22 🔴"
    );
    assert_eq!(segments[0].label.as_deref(), Some("Cover"));

    let stats = map.statistics();
    assert_eq!(stats.total_pages, 22);
    assert_eq!(stats.rule_negative_pages, 2);
    assert_eq!(stats.rule_positive_pages, 10);
    assert_eq!(stats.region_pages, 8);
    assert_eq!(stats.unaccounted_pages, 2);
}
