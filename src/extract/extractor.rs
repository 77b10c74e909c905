//! Page number extraction
//!
//! One text-access call per applicable page of every page-number region.
//! Calls run with bounded parallelism and observe a shared cancellation
//! token; a cancelled run publishes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;

use super::cache::DerivationCache;
use super::cancel::CancelToken;
use super::parse::parse_page_token;
use super::source::TextSource;
use super::types::{
    ExtractError, ExtractionOptions, ExtractionOutcome, RegionDerivedPageNumber, Result,
};
use crate::page_config::{ApplicablePagesResolver, Region};

/// Region-derived page number extractor
#[derive(Debug, Clone, Default)]
pub struct PageNumberExtractor {
    options: ExtractionOptions,
}

impl PageNumberExtractor {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Read one page under one region.
    ///
    /// Text-access failures, timeouts, empty text and unparsable text all
    /// yield `None`.
    pub async fn read_page(
        &self,
        source: &dyn TextSource,
        region: &Region,
        page: u32,
    ) -> Option<RegionDerivedPageNumber> {
        let call = source.text_at(page, &region.bbox);
        let text = match self.options.text_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(text) => text,
                Err(_) => {
                    tracing::debug!(region = %region.id, page, "Text access timed out");
                    return None;
                }
            },
            None => call.await,
        };

        let text = match text {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(region = %region.id, page, error = %e, "Text access failed");
                return None;
            }
        };

        if text.trim().is_empty() {
            return None;
        }

        let Some(token) = parse_page_token(&text) else {
            tracing::debug!(region = %region.id, page, text = %text, "Unparsable page text");
            return None;
        };

        Some(RegionDerivedPageNumber::new(
            page,
            token.value,
            &region.id,
            &region.name,
        ))
    }

    /// Extract readings for every page-number region.
    ///
    /// Readings come back in region order, then page order. Only a document
    /// that cannot be opened is an error.
    pub async fn extract(
        &self,
        regions: &[Region],
        page_count: u32,
        source: &dyn TextSource,
        cancel: &CancelToken,
    ) -> Result<ExtractionOutcome> {
        if cancel.is_cancelled() {
            return Ok(ExtractionOutcome::Cancelled);
        }

        source.open().await.map_err(ExtractError::DocumentUnavailable)?;

        // Region index rather than a borrow keeps the spawned future `Send`
        let jobs: Vec<(usize, u32)> = regions
            .iter()
            .enumerate()
            .filter(|(_, region)| region.is_page_number())
            .flat_map(|(index, region)| {
                ApplicablePagesResolver::resolve(region, page_count)
                    .into_iter()
                    .map(move |page| (index, page))
            })
            .collect();
        let total = jobs.len();

        let this = self;
        let mut readings_stream = stream::iter(jobs)
            .map(move |(index, page)| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                this.read_page(source, &regions[index], page).await
            })
            .buffered(self.options.concurrency.max(1));

        let mut readings = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(ExtractionOutcome::Cancelled),
                next = readings_stream.next() => next,
            };
            match next {
                Some(reading) => readings.extend(reading),
                None => break,
            }
        }

        if cancel.is_cancelled() {
            return Ok(ExtractionOutcome::Cancelled);
        }

        tracing::info!(
            calls = total,
            readings = readings.len(),
            "Page number extraction finished"
        );
        Ok(ExtractionOutcome::Completed(readings))
    }

    /// Extract through the cache.
    ///
    /// A hit skips text access entirely; a completed miss overwrites the
    /// stored entry. Cancelled runs never touch the cache.
    pub async fn derive(
        &self,
        project_id: &str,
        regions: &[Region],
        page_count: u32,
        source: &dyn TextSource,
        cache: Option<&DerivationCache>,
        cancel: &CancelToken,
    ) -> Result<ExtractionOutcome> {
        let cache_key = DerivationCache::compute_key(project_id, regions);

        if let Some(cached) = cache.and_then(|cache| cache.lookup(project_id, &cache_key)) {
            if cancel.is_cancelled() {
                return Ok(ExtractionOutcome::Cancelled);
            }
            return Ok(ExtractionOutcome::Completed(refresh_names(cached, regions)));
        }

        let outcome = self.extract(regions, page_count, source, cancel).await?;
        if let (Some(cache), ExtractionOutcome::Completed(readings)) = (cache, &outcome) {
            cache.store(project_id, &cache_key, readings);
        }
        Ok(outcome)
    }
}

/// Replace cached region names with the current ones
fn refresh_names(
    mut readings: Vec<RegionDerivedPageNumber>,
    regions: &[Region],
) -> Vec<RegionDerivedPageNumber> {
    let names: HashMap<&str, &str> = regions
        .iter()
        .map(|r| (r.id.as_str(), r.name.as_str()))
        .collect();
    for reading in &mut readings {
        if let Some(name) = names.get(reading.region_id.as_str()) {
            if reading.region_name != *name {
                reading.region_name = (*name).to_string();
            }
        }
    }
    readings
}

// ============================================================
// Background Tasks
// ============================================================

/// Snapshot of the inputs one derivation runs against
#[derive(Debug, Clone, PartialEq)]
pub struct DerivationInput {
    pub project_id: String,
    pub regions: Vec<Region>,
    pub page_count: u32,
}

impl DerivationInput {
    pub fn new(project_id: impl Into<String>, regions: Vec<Region>, page_count: u32) -> Self {
        Self {
            project_id: project_id.into(),
            regions,
            page_count,
        }
    }
}

/// A derivation running on the tokio runtime
#[derive(Debug)]
pub struct ExtractionTask {
    cancel: CancelToken,
    handle: JoinHandle<Result<ExtractionOutcome>>,
}

impl ExtractionTask {
    /// Spawn a derivation for `input`
    pub fn spawn(
        extractor: Arc<PageNumberExtractor>,
        input: DerivationInput,
        source: Arc<dyn TextSource>,
        cache: Option<DerivationCache>,
    ) -> Self {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            extractor
                .derive(
                    &input.project_id,
                    &input.regions,
                    input.page_count,
                    source.as_ref(),
                    cache.as_ref(),
                    &token,
                )
                .await
        });
        Self { cancel, handle }
    }

    /// Abandon the derivation; its outcome becomes `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome
    pub async fn join(self) -> Result<ExtractionOutcome> {
        self.handle
            .await
            .map_err(|e| ExtractError::TaskFailed(e.to_string()))?
    }
}

/// Keeps at most one derivation in flight.
///
/// Starting a new derivation cancels the previous one, so only outcomes for
/// the latest inputs are ever observed.
pub struct DerivationSupervisor {
    extractor: Arc<PageNumberExtractor>,
    source: Arc<dyn TextSource>,
    cache: Option<DerivationCache>,
    current: Option<ExtractionTask>,
}

impl std::fmt::Debug for DerivationSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationSupervisor")
            .field("extractor", &self.extractor)
            .field("running", &self.current.is_some())
            .finish_non_exhaustive()
    }
}

impl DerivationSupervisor {
    pub fn new(
        extractor: PageNumberExtractor,
        source: Arc<dyn TextSource>,
        cache: Option<DerivationCache>,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            source,
            cache,
            current: None,
        }
    }

    /// Cancel the in-flight derivation and start one for `input`
    pub fn start(&mut self, input: DerivationInput) {
        self.cancel();
        tracing::debug!(project_id = %input.project_id, "Starting page number derivation");
        self.current = Some(ExtractionTask::spawn(
            Arc::clone(&self.extractor),
            input,
            Arc::clone(&self.source),
            self.cache.clone(),
        ));
    }

    /// Switch documents; the in-flight derivation is cancelled
    pub fn replace_source(&mut self, source: Arc<dyn TextSource>) {
        self.cancel();
        self.source = source;
    }

    /// Cancel the in-flight derivation, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the latest derivation; `None` if nothing was started
    pub async fn wait(&mut self) -> Option<Result<ExtractionOutcome>> {
        let task = self.current.take()?;
        Some(task.join().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ExtractionBox;
    use crate::extract::source::{FragmentTextSource, TextFragment};
    use crate::extract::types::TextSourceError;
    use crate::page_config::RegionType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn footer() -> ExtractionBox {
        ExtractionBox::new(280.0, 20.0, 330.0, 40.0)
    }

    fn numbered_source(pages: u32) -> FragmentTextSource {
        (1..=pages).fold(FragmentTextSource::new(pages), |source, page| {
            source.with_fragment(page, TextFragment::new(page.to_string(), 300.0, 25.0, 10.0, 8.0))
        })
    }

    /// Source that counts calls and can fail, stall or refuse to open
    struct ScriptedSource {
        inner: FragmentTextSource,
        calls: AtomicUsize,
        failing_page: Option<u32>,
        stalled_page: Option<u32>,
        delay: Duration,
        openable: bool,
    }

    impl ScriptedSource {
        fn new(inner: FragmentTextSource) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                failing_page: None,
                stalled_page: None,
                delay: Duration::ZERO,
                openable: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextSource for ScriptedSource {
        async fn open(&self) -> std::result::Result<(), TextSourceError> {
            if self.openable {
                Ok(())
            } else {
                Err(TextSourceError::DocumentUnavailable("corrupt.pdf".to_string()))
            }
        }

        async fn text_at(
            &self,
            page: u32,
            bbox: &ExtractionBox,
        ) -> std::result::Result<String, TextSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.stalled_page == Some(page) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing_page == Some(page) {
                return Err(TextSourceError::PageUnavailable {
                    page,
                    message: "render failed".to_string(),
                });
            }
            self.inner.text_at(page, bbox).await
        }
    }

    #[tokio::test]
    async fn test_extract_only_applicable_pages() {
        let regions = vec![
            Region::page_number("r1", "Footer", footer()).on_range("2-4").except([3]),
            Region::new("x", "Exclude", RegionType::Exclude, footer()),
        ];
        let source = numbered_source(5);
        let outcome = PageNumberExtractor::default()
            .extract(&regions, 5, &source, &CancelToken::new())
            .await
            .unwrap();

        let readings = outcome.into_readings().unwrap();
        assert_eq!(
            readings,
            vec![
                RegionDerivedPageNumber::new(2, "2", "r1", "Footer"),
                RegionDerivedPageNumber::new(4, "4", "r1", "Footer"),
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_preserves_region_then_page_order() {
        let regions = vec![
            Region::page_number("b", "Second", footer()).on_range("1-3"),
            Region::page_number("a", "First", footer()).on_page(2),
        ];
        let source = numbered_source(3);
        let extractor =
            PageNumberExtractor::new(ExtractionOptions::builder().concurrency(8).build());
        let readings = extractor
            .extract(&regions, 3, &source, &CancelToken::new())
            .await
            .unwrap()
            .into_readings()
            .unwrap();

        let order: Vec<(&str, u32)> = readings
            .iter()
            .map(|r| (r.region_id.as_str(), r.document_page))
            .collect();
        assert_eq!(order, vec![("b", 1), ("b", 2), ("b", 3), ("a", 2)]);
    }

    #[tokio::test]
    async fn test_page_failures_do_not_abort_siblings() {
        let mut source = ScriptedSource::new(numbered_source(4));
        source.failing_page = Some(2);
        source.stalled_page = Some(3);

        let extractor = PageNumberExtractor::new(
            ExtractionOptions::builder()
                .text_timeout(Duration::from_millis(50))
                .build(),
        );
        let regions = vec![Region::page_number("r1", "Footer", footer())];
        let readings = extractor
            .extract(&regions, 4, &source, &CancelToken::new())
            .await
            .unwrap()
            .into_readings()
            .unwrap();

        let pages: Vec<u32> = readings.iter().map(|r| r.document_page).collect();
        assert_eq!(pages, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_garbage_text_yields_no_reading() {
        let source = FragmentTextSource::new(2)
            .with_fragment(1, TextFragment::new("—", 300.0, 25.0, 10.0, 8.0))
            .with_fragment(2, TextFragment::new("xiv", 300.0, 25.0, 10.0, 8.0));
        let regions = vec![Region::page_number("r1", "Footer", footer())];
        let readings = PageNumberExtractor::default()
            .extract(&regions, 2, &source, &CancelToken::new())
            .await
            .unwrap()
            .into_readings()
            .unwrap();
        assert_eq!(readings, vec![RegionDerivedPageNumber::new(2, "xiv", "r1", "Footer")]);
    }

    #[tokio::test]
    async fn test_unopenable_document_is_an_error() {
        let mut source = ScriptedSource::new(numbered_source(2));
        source.openable = false;
        let regions = vec![Region::page_number("r1", "Footer", footer())];

        let result = PageNumberExtractor::default()
            .extract(&regions, 2, &source, &CancelToken::new())
            .await;
        assert!(matches!(result, Err(ExtractError::DocumentUnavailable(_))));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = ScriptedSource::new(numbered_source(3));
        let cancel = CancelToken::new();
        cancel.cancel();

        let regions = vec![Region::page_number("r1", "Footer", footer())];
        let outcome = PageNumberExtractor::default()
            .extract(&regions, 3, &source, &cancel)
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_derive_uses_cache() {
        let source = ScriptedSource::new(numbered_source(3));
        let cache = DerivationCache::in_memory();
        let extractor = PageNumberExtractor::default();
        let regions = vec![Region::page_number("r1", "Footer", footer())];

        let first = extractor
            .derive("p1", &regions, 3, &source, Some(&cache), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(source.calls(), 3);

        let second = extractor
            .derive("p1", &regions, 3, &source, Some(&cache), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(source.calls(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_hit_refreshes_names() {
        let source = numbered_source(2);
        let cache = DerivationCache::in_memory();
        let extractor = PageNumberExtractor::default();
        let mut regions = vec![Region::page_number("r1", "Footer", footer())];

        extractor
            .derive("p1", &regions, 2, &source, Some(&cache), &CancelToken::new())
            .await
            .unwrap();

        regions[0].name = "Bottom margin".to_string();
        let readings = extractor
            .derive("p1", &regions, 2, &source, Some(&cache), &CancelToken::new())
            .await
            .unwrap()
            .into_readings()
            .unwrap();
        assert!(readings.iter().all(|r| r.region_name == "Bottom margin"));
    }

    #[tokio::test]
    async fn test_cancelled_derive_leaves_cache_untouched() {
        let mut source = ScriptedSource::new(numbered_source(20));
        source.delay = Duration::from_millis(20);
        let source: Arc<dyn TextSource> = Arc::new(source);

        let cache = DerivationCache::in_memory();
        let regions = vec![Region::page_number("r1", "Footer", footer())];
        let task = ExtractionTask::spawn(
            Arc::new(PageNumberExtractor::new(ExtractionOptions::sequential())),
            DerivationInput::new("p1", regions.clone(), 20),
            source,
            Some(cache.clone()),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        task.cancel();
        assert!(task.join().await.unwrap().is_cancelled());

        let key = DerivationCache::compute_key("p1", &regions);
        assert_eq!(cache.lookup("p1", &key), None);
    }

    /// Source that records the peak number of `text_at` calls in flight
    struct PeakSource {
        inner: FragmentTextSource,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TextSource for PeakSource {
        async fn text_at(
            &self,
            page: u32,
            bbox: &ExtractionBox,
        ) -> std::result::Result<String, TextSourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.text_at(page, bbox).await
        }
    }

    #[tokio::test]
    async fn test_calls_in_flight_never_exceed_concurrency() {
        let source = PeakSource {
            inner: numbered_source(12),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let extractor =
            PageNumberExtractor::new(ExtractionOptions::builder().concurrency(3).build());
        let regions = vec![Region::page_number("r1", "Footer", footer())];

        let readings = extractor
            .extract(&regions, 12, &source, &CancelToken::new())
            .await
            .unwrap()
            .into_readings()
            .unwrap();
        assert_eq!(readings.len(), 12);

        let peak = source.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak {} calls in flight", peak);
    }

    /// Starts a derivation from a plain function rather than the test body
    fn start_in_background(source: Arc<dyn TextSource>, regions: Vec<Region>) -> ExtractionTask {
        ExtractionTask::spawn(
            Arc::new(PageNumberExtractor::default()),
            DerivationInput::new("p1", regions, 3),
            source,
            Some(DerivationCache::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_spawned_task_completes() {
        let regions = vec![Region::page_number("r1", "Footer", footer())];
        let task = start_in_background(Arc::new(numbered_source(3)), regions);

        let readings = task.join().await.unwrap().into_readings().unwrap();
        let pages: Vec<u32> = readings.iter().map(|r| r.document_page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_supervisor_restarts_on_new_input() {
        let mut source = ScriptedSource::new(numbered_source(10));
        source.delay = Duration::from_millis(10);

        let mut supervisor = DerivationSupervisor::new(
            PageNumberExtractor::new(ExtractionOptions::sequential()),
            Arc::new(source),
            None,
        );
        assert!(supervisor.wait().await.is_none());

        supervisor.start(DerivationInput::new(
            "p1",
            vec![Region::page_number("r1", "Footer", footer())],
            10,
        ));
        supervisor.start(DerivationInput::new(
            "p1",
            vec![Region::page_number("r1", "Footer", footer()).on_range("1-2")],
            10,
        ));

        let readings = supervisor
            .wait()
            .await
            .unwrap()
            .unwrap()
            .into_readings()
            .unwrap();
        let pages: Vec<u32> = readings.iter().map(|r| r.document_page).collect();
        assert_eq!(pages, vec![1, 2]);
        assert!(!supervisor.is_running());
    }
}
