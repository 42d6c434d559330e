use std::collections::BTreeMap;

use companion::CompanionError;
use tracing::{debug, info, warn};

use crate::error::CycleError;
use crate::payload::ImagePayload;
use crate::preload::{DecodeError, Preloaded};
use crate::resource::{DisplayResource, ResourceStore};
use crate::surface::RenderedSurface;

/// What happened to a finished image fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Materialised and waiting on a preload of `payload`.
    Materialized { seq: u64, payload: ImagePayload },
    /// A newer background is already displayed; the payload was dropped.
    Stale { seq: u64 },
}

/// What happened to a finished preload.
#[derive(Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped {
        seq: u64,
        url: String,
        released: Option<String>,
        preloaded: Preloaded,
    },
    /// A newer background won the race; this cycle's resource was released unseen.
    Stale { seq: u64 },
}

/// Owns the rendered surface and every display resource created for it.
///
/// Each update cycle gets a sequence number from [`begin_update`]. A cycle
/// may only attach its resource if no higher-numbered cycle has been applied,
/// so completions arriving out of order never regress the background. The
/// attached resource lives in `current` and is released only after its
/// successor is attached; resources of abandoned cycles are released as soon
/// as the abandonment is noticed.
///
/// [`begin_update`]: BackgroundUpdater::begin_update
pub struct BackgroundUpdater<S, R> {
    surface: S,
    resources: R,
    current: Option<DisplayResource>,
    pending: BTreeMap<u64, DisplayResource>,
    next_seq: u64,
    applied: Option<u64>,
}

impl<S: RenderedSurface, R: ResourceStore> BackgroundUpdater<S, R> {
    pub fn new(surface: S, resources: R) -> Self {
        Self {
            surface,
            resources,
            current: None,
            pending: BTreeMap::new(),
            next_seq: 1,
            applied: None,
        }
    }

    /// Starts an update cycle and returns its sequence number.
    pub fn begin_update(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn is_stale(&self, seq: u64) -> bool {
        self.applied.is_some_and(|applied| seq < applied)
    }

    pub fn on_fetched(
        &mut self,
        seq: u64,
        result: Result<ImagePayload, CompanionError>,
    ) -> Result<FetchOutcome, CycleError> {
        let payload = result?;
        if self.is_stale(seq) {
            debug!(seq, applied = ?self.applied, "dropping stale background payload");
            return Ok(FetchOutcome::Stale { seq });
        }

        let resource = self.resources.materialize(seq, &payload)?;
        debug!(seq, url = resource.url(), len = payload.len(), "materialised background");
        if let Some(duplicate) = self.pending.insert(seq, resource) {
            warn!(seq, "update cycle materialised twice; releasing the first copy");
            self.release(duplicate);
        }
        Ok(FetchOutcome::Materialized { seq, payload })
    }

    pub fn on_preloaded(
        &mut self,
        seq: u64,
        result: Result<Preloaded, DecodeError>,
    ) -> Result<SwapOutcome, CycleError> {
        let Some(resource) = self.pending.remove(&seq) else {
            warn!(seq, "preload finished for an unknown update cycle");
            return Ok(SwapOutcome::Stale { seq });
        };

        let preloaded = match result {
            Ok(preloaded) => preloaded,
            Err(err) => {
                self.release(resource);
                return Err(err.into());
            }
        };

        if self.is_stale(seq) {
            debug!(seq, applied = ?self.applied, "discarding stale preload");
            self.release(resource);
            return Ok(SwapOutcome::Stale { seq });
        }

        if let Err(err) = self.surface.set_background(resource.url()) {
            self.release(resource);
            return Err(err.into());
        }

        let url = resource.url().to_string();
        let previous = self.current.replace(resource);
        self.applied = Some(seq);
        let released = previous.map(|old| {
            let old_url = old.url().to_string();
            self.release(old);
            old_url
        });

        info!(
            seq,
            %url,
            width = preloaded.width,
            height = preloaded.height,
            format = ?preloaded.format,
            "background updated"
        );
        Ok(SwapOutcome::Swapped {
            seq,
            url,
            released,
            preloaded,
        })
    }

    /// Detaches the background and releases every resource still held.
    ///
    /// If the surface cannot be cleared the attached resource is kept.
    pub fn shutdown(&mut self) -> Result<(), CycleError> {
        for (_, resource) in std::mem::take(&mut self.pending) {
            self.release(resource);
        }
        if let Some(current) = self.current.take() {
            if let Err(err) = self.surface.clear_background() {
                self.current = Some(current);
                return Err(err.into());
            }
            self.release(current);
        }
        Ok(())
    }

    /// Forgets a cycle whose work was lost, releasing its resource if one
    /// was materialised. The displayed background is never touched.
    pub fn abandon(&mut self, seq: u64) {
        if let Some(resource) = self.pending.remove(&seq) {
            debug!(seq, "abandoning update cycle");
            self.release(resource);
        }
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(DisplayResource::url)
    }

    /// Cycles materialised but not yet preloaded.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    fn release(&mut self, resource: DisplayResource) {
        let url = resource.url().to_string();
        match self.resources.release(resource) {
            Ok(()) => debug!(%url, "released background resource"),
            Err(err) => warn!(%url, error = %err, "failed to release background resource"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::{fixtures, preload};
    use crate::resource::MemoryResources;
    use crate::surface::MemorySurface;

    type Updater = BackgroundUpdater<MemorySurface, MemoryResources>;

    fn updater() -> Updater {
        BackgroundUpdater::new(MemorySurface::new(), MemoryResources::new())
    }

    fn fetch(updater: &mut Updater, seq: u64, shade: u8) -> ImagePayload {
        match updater
            .on_fetched(seq, Ok(ImagePayload::new(fixtures::png(2, 2, shade))))
            .unwrap()
        {
            FetchOutcome::Materialized { payload, .. } => payload,
            other => panic!("expected materialised payload, got {other:?}"),
        }
    }

    fn finish(updater: &mut Updater, seq: u64, payload: &ImagePayload) -> SwapOutcome {
        updater.on_preloaded(seq, preload(payload)).unwrap()
    }

    #[test]
    fn swaps_and_releases_previous() {
        let mut updater = updater();
        let first = updater.begin_update();
        let payload = fetch(&mut updater, first, 1);
        assert!(matches!(
            finish(&mut updater, first, &payload),
            SwapOutcome::Swapped { released: None, .. }
        ));
        let first_url = updater.current_url().unwrap().to_string();

        let second = updater.begin_update();
        let payload = fetch(&mut updater, second, 2);
        // The new resource exists alongside the attached one until the swap.
        assert_eq!(updater.resources().outstanding(), 2);
        assert_eq!(updater.surface().background(), Some(first_url.as_str()));

        let outcome = finish(&mut updater, second, &payload);
        assert!(matches!(
            outcome,
            SwapOutcome::Swapped { released: Some(ref url), .. } if *url == first_url
        ));
        assert_eq!(updater.resources().outstanding(), 1);
        assert_eq!(updater.surface().background(), updater.current_url());
        assert_eq!(updater.applied_seq(), Some(second));
    }

    #[test]
    fn decode_failure_keeps_current_background() {
        let mut updater = updater();
        let first = updater.begin_update();
        let payload = fetch(&mut updater, first, 1);
        finish(&mut updater, first, &payload);
        let shown = updater.current_url().unwrap().to_string();

        let broken = updater.begin_update();
        let payload = match updater
            .on_fetched(broken, Ok(ImagePayload::new(b"garbage".to_vec())))
            .unwrap()
        {
            FetchOutcome::Materialized { payload, .. } => payload,
            other => panic!("unexpected {other:?}"),
        };
        let err = updater.on_preloaded(broken, preload(&payload)).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Decode);
        assert_eq!(updater.current_url(), Some(shown.as_str()));
        assert_eq!(updater.resources().outstanding(), 1);
        assert_eq!(updater.pending(), 0);
    }

    #[test]
    fn late_older_fetch_is_dropped_without_materialising() {
        let mut updater = updater();
        let older = updater.begin_update();
        let newer = updater.begin_update();

        let payload = fetch(&mut updater, newer, 2);
        finish(&mut updater, newer, &payload);
        let newer_url = updater.current_url().unwrap().to_string();

        let outcome = updater
            .on_fetched(older, Ok(ImagePayload::new(fixtures::png(2, 2, 1))))
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Stale { seq } if seq == older));
        assert_eq!(updater.resources().outstanding(), 1);
        assert!(updater.resources().is_live(&newer_url));
        assert!(updater.resources().released().is_empty());
    }

    #[test]
    fn late_older_preload_releases_only_its_own_resource() {
        let mut updater = updater();
        let older = updater.begin_update();
        let newer = updater.begin_update();

        let older_payload = fetch(&mut updater, older, 1);
        let newer_payload = fetch(&mut updater, newer, 2);
        finish(&mut updater, newer, &newer_payload);
        let newer_url = updater.current_url().unwrap().to_string();

        let outcome = finish(&mut updater, older, &older_payload);
        assert_eq!(outcome, SwapOutcome::Stale { seq: older });
        assert_eq!(updater.current_url(), Some(newer_url.as_str()));
        assert!(updater.resources().is_live(&newer_url));
        assert_eq!(updater.resources().outstanding(), 1);
        assert_eq!(updater.surface().history(), &[newer_url]);
    }

    #[test]
    fn shutdown_detaches_then_releases() {
        let mut updater = updater();
        let first = updater.begin_update();
        let payload = fetch(&mut updater, first, 1);
        finish(&mut updater, first, &payload);
        let abandoned = updater.begin_update();
        fetch(&mut updater, abandoned, 2);

        updater.shutdown().unwrap();
        assert_eq!(updater.surface().background(), None);
        assert_eq!(updater.resources().outstanding(), 0);
        assert_eq!(updater.current_url(), None);
    }
}
