//! Image-backed sample stream over a consolidated dataset.
//!
//! Ownership model:
//! - `ImageSampler` binds records to on-disk image payloads at construction
//!   and is immutable afterwards; share it by reference (or `Arc`) across
//!   any number of read-only sample workers.
//! - `SamplePrefetcher` owns a background worker that drains a bounded queue
//!   of resolved samples from a shared sampler.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::data::{Dataset, PlaceRecord, TargetSummary};
use crate::errors::DatasetError;
use crate::hash::stable_hash_index;
use crate::transform::{self, CropVariant, ImageTensor};
use crate::types::{LabelId, RecordKey};

/// One resolved training sample: a normalized tensor and its label id.
pub type Sample = (ImageTensor, LabelId);

/// An enlarged, augmented, index-addressable view of an image corpus.
///
/// The reported length is `real_count * CropVariant::arity()`: every record
/// is visited once per crop variant across one full pass. Index `i` resolves
/// to record `i % real_count` (in the collection's stable iteration order)
/// under variant `i / real_count`.
pub struct ImageSampler {
    config: SamplerConfig,
    records: IndexMap<RecordKey, PlaceRecord>,
    targets: Vec<TargetSummary>,
    pruned: Vec<RecordKey>,
}

impl ImageSampler {
    /// Bind a dataset to image files under `root`.
    ///
    /// For every record key this reads `root/<key><image_ext>`. Records whose
    /// file cannot be read are pruned from the sampler's collection rather
    /// than failing construction; the pruned keys stay observable through
    /// [`ImageSampler::pruned_keys`]. This is the only point after cleansing
    /// where the record count can shrink.
    pub fn new(root: impl AsRef<Path>, dataset: &Dataset, config: SamplerConfig) -> Self {
        let root = root.as_ref();
        let mut records = IndexMap::with_capacity(dataset.len());
        let mut pruned = Vec::new();
        for (key, record) in dataset.records() {
            let path = image_path(root, key, &config.image_ext);
            match fs::read(&path) {
                Ok(bytes) => {
                    let mut loaded = record.clone();
                    loaded.image = Some(bytes);
                    records.insert(key.clone(), loaded);
                }
                Err(error) => {
                    warn!(key = %key, path = %path.display(), %error, "pruning record with unreadable image");
                    pruned.push(key.clone());
                }
            }
        }
        debug!(
            loaded = records.len(),
            pruned = pruned.len(),
            "image payloads bound"
        );
        Self {
            config,
            records,
            targets: dataset.targets().to_vec(),
            pruned,
        }
    }

    /// Number of records that survived image loading.
    pub fn real_len(&self) -> usize {
        self.records.len()
    }

    /// Virtual sample count: `real_len * augmentation arity`.
    pub fn len(&self) -> usize {
        self.real_len() * CropVariant::arity()
    }

    /// True when no record survived image loading.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys of records dropped because their image file was unreadable.
    pub fn pruned_keys(&self) -> &[RecordKey] {
        &self.pruned
    }

    /// The consolidated target table backing label resolution.
    pub fn targets(&self) -> &[TargetSummary] {
        &self.targets
    }

    /// Number of classification labels.
    pub fn num_classes(&self) -> usize {
        self.targets.len()
    }

    /// Human-readable name for a label id, for prediction reporting.
    pub fn label_name(&self, id: LabelId) -> Option<&str> {
        self.targets
            .iter()
            .find(|summary| summary.id == id)
            .map(|summary| summary.name.as_str())
    }

    /// Resolve the sample at a virtual index.
    ///
    /// Runs the full pipeline: decode, blank-bottom trim, variant crop,
    /// resize, normalize.
    ///
    /// # Panics
    ///
    /// Panics when the record's target is missing from the target table.
    /// That can only happen when the consolidation invariant was broken,
    /// which is a logic error rather than a data condition.
    pub fn sample(&self, index: usize) -> Result<Sample, DatasetError> {
        let len = self.len();
        if index >= len {
            return Err(DatasetError::IndexOutOfBounds { index, len });
        }
        let real = self.real_len();
        let (key, record) = self
            .records
            .get_index(index % real)
            .expect("index bounded by real_len");
        let bytes = record
            .image
            .as_ref()
            .expect("image payload attached at construction");
        let img = transform::decode(key, bytes)?;
        let variant = CropVariant::ALL[index / real];
        let tensor = transform::prepare(&img, variant, self.config.sample_edge);
        let label = self.resolve_label(&record.target);
        Ok((tensor, label))
    }

    /// Resolve a batch of virtual indices in parallel.
    ///
    /// Results keep the order of `indices`. Safe because sample resolution
    /// is read-only over the frozen record pool.
    pub fn batch(&self, indices: &[usize]) -> Result<Vec<Sample>, DatasetError> {
        indices
            .par_iter()
            .map(|&index| self.sample(index))
            .collect()
    }

    /// Deterministic permutation of the full virtual index space for an
    /// epoch. The same seed and epoch always yield the same order.
    pub fn shuffled_indices(&self, epoch: u64) -> Vec<usize> {
        let seed = self.config.seed ^ epoch;
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&index| stable_hash_index(seed, index));
        order
    }

    fn resolve_label(&self, target: &str) -> LabelId {
        self.targets
            .iter()
            .find(|summary| summary.name == target)
            .map(|summary| summary.id)
            .unwrap_or_else(|| {
                panic!("record target '{target}' is missing from the consolidated label table")
            })
    }
}

fn image_path(root: &Path, key: &str, ext: &str) -> PathBuf {
    root.join(format!("{key}{ext}"))
}

/// Background prefetcher that fills a bounded queue with resolved samples.
///
/// The worker walks a fixed index order over a shared, immutable sampler and
/// stops when the order is exhausted or the prefetcher is dropped.
pub struct SamplePrefetcher {
    receiver: Option<mpsc::Receiver<Result<Sample, DatasetError>>>,
    handle: Option<thread::JoinHandle<()>>,
    stats: Arc<PrefetcherStats>,
}

#[derive(Default)]
/// Prefetcher runtime counters.
struct PrefetcherStats {
    queued: AtomicUsize,
    produced: AtomicUsize,
    errors: AtomicUsize,
}

impl SamplePrefetcher {
    /// Start a worker resolving `order` against `sampler`, keeping at most
    /// `capacity` samples queued ahead of the consumer.
    pub fn new(sampler: Arc<ImageSampler>, order: Vec<usize>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let stats = Arc::new(PrefetcherStats::default());
        let stats_thread = Arc::clone(&stats);
        let handle = thread::spawn(move || {
            for index in order {
                let result = sampler.sample(index);
                if result.is_err() {
                    stats_thread.errors.fetch_add(1, Ordering::Relaxed);
                }
                if sender.send(result).is_err() {
                    return;
                }
                stats_thread.queued.fetch_add(1, Ordering::Relaxed);
                stats_thread.produced.fetch_add(1, Ordering::Relaxed);
            }
        });
        Self {
            receiver: Some(receiver),
            handle: Some(handle),
            stats,
        }
    }

    /// Block until the next prefetched sample is available, or `None` once
    /// the index order is exhausted.
    pub fn next(&self) -> Option<Result<Sample, DatasetError>> {
        let result = self.receiver.as_ref()?.recv().ok()?;
        self.stats
            .queued
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| {
                Some(value.saturating_sub(1))
            })
            .ok();
        Some(result)
    }

    /// Number of prefetched samples currently queued.
    pub fn queue_len(&self) -> usize {
        self.stats.queued.load(Ordering::Relaxed)
    }

    /// Total number of samples produced by the background worker.
    pub fn produced_count(&self) -> usize {
        self.stats.produced.load(Ordering::Relaxed)
    }

    /// Total number of errors produced by the background worker.
    pub fn error_count(&self) -> usize {
        self.stats.errors.load(Ordering::Relaxed)
    }
}

impl Drop for SamplePrefetcher {
    fn drop(&mut self) {
        self.receiver.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use tempfile::tempdir;

    fn record(key: &str, target: &str) -> PlaceRecord {
        PlaceRecord {
            key: key.to_string(),
            lng: 0.0,
            lat: 0.0,
            target: target.to_string(),
            image: None,
        }
    }

    fn png_config() -> SamplerConfig {
        SamplerConfig {
            image_ext: ".png".to_string(),
            sample_edge: 8,
            ..SamplerConfig::default()
        }
    }

    fn write_solid(dir: &Path, key: &str, color: [u8; 3]) {
        let img = RgbImage::from_pixel(16, 8, Rgb(color));
        img.save(dir.join(format!("{key}.png"))).unwrap();
    }

    /// Landscape image whose left half is red and right half is blue, so the
    /// two crop variants produce visibly different tensors.
    fn write_split(dir: &Path, key: &str) {
        let img = RgbImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        img.save(dir.join(format!("{key}.png"))).unwrap();
    }

    #[test]
    fn virtual_length_reflects_post_prune_count() {
        let dir = tempdir().unwrap();
        write_solid(dir.path(), "a", [255, 255, 255]);
        write_solid(dir.path(), "b", [255, 255, 255]);
        let dataset = Dataset::from_records(vec![
            record("a", "X"),
            record("b", "X"),
            record("missing", "Y"),
        ]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        assert_eq!(sampler.real_len(), 2);
        assert_eq!(sampler.len(), 4);
        assert_eq!(sampler.pruned_keys(), vec!["missing".to_string()]);
    }

    #[test]
    fn labels_cycle_through_records_per_variant() {
        let dir = tempdir().unwrap();
        write_solid(dir.path(), "a", [200, 200, 200]);
        write_solid(dir.path(), "b", [200, 200, 200]);
        let dataset = Dataset::from_records(vec![record("a", "X"), record("b", "Y")]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let labels: Vec<LabelId> = (0..sampler.len())
            .map(|index| sampler.sample(index).unwrap().1)
            .collect();
        // Record order repeats once per variant across the full pass.
        assert_eq!(labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn variant_depends_on_the_sample_index() {
        let dir = tempdir().unwrap();
        write_split(dir.path(), "a");
        let dataset = Dataset::from_records(vec![record("a", "X")]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let (first, _) = sampler.sample(0).unwrap();
        let (second, _) = sampler.sample(1).unwrap();
        // Index 0 sees the red left half, index 1 the blue right half.
        assert!(first.get(0, 4, 4) > first.get(2, 4, 4));
        assert!(second.get(2, 4, 4) > second.get(0, 4, 4));
    }

    #[test]
    fn out_of_bounds_index_is_an_error() {
        let dir = tempdir().unwrap();
        write_solid(dir.path(), "a", [255, 255, 255]);
        let dataset = Dataset::from_records(vec![record("a", "X")]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let err = sampler.sample(2).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::IndexOutOfBounds { index: 2, len: 2 }
        ));
    }

    #[test]
    fn malformed_payload_surfaces_a_decode_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not an image").unwrap();
        let dataset = Dataset::from_records(vec![record("a", "X")]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let err = sampler.sample(0).unwrap_err();
        assert!(matches!(err, DatasetError::ImageDecode { .. }));
    }

    #[test]
    #[should_panic(expected = "missing from the consolidated label table")]
    fn unresolvable_label_panics() {
        let dir = tempdir().unwrap();
        write_solid(dir.path(), "a", [255, 255, 255]);
        let mut keyed = IndexMap::new();
        keyed.insert("a".to_string(), record("a", "X"));
        // An explicitly supplied, inconsistent target table breaks the
        // consolidation invariant.
        let dataset = Dataset::with_targets(keyed, Vec::new());
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let _ = sampler.sample(0);
    }

    #[test]
    fn shuffled_indices_are_a_deterministic_permutation() {
        let dir = tempdir().unwrap();
        let mut records = Vec::new();
        for idx in 0..6 {
            let key = format!("r{idx}");
            write_solid(dir.path(), &key, [255, 255, 255]);
            records.push(record(&key, "X"));
        }
        let dataset = Dataset::from_records(records);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());

        let first = sampler.shuffled_indices(0);
        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..sampler.len()).collect::<Vec<_>>());
        assert_eq!(first, sampler.shuffled_indices(0));
        assert_ne!(first, sampler.shuffled_indices(1));
    }

    #[test]
    fn parallel_batch_matches_sequential_samples() {
        let dir = tempdir().unwrap();
        write_split(dir.path(), "a");
        write_solid(dir.path(), "b", [120, 130, 140]);
        let dataset = Dataset::from_records(vec![record("a", "X"), record("b", "Y")]);
        let sampler = ImageSampler::new(dir.path(), &dataset, png_config());
        let indices: Vec<usize> = (0..sampler.len()).collect();
        let batch = sampler.batch(&indices).unwrap();
        for (index, sample) in indices.iter().zip(&batch) {
            assert_eq!(*sample, sampler.sample(*index).unwrap());
        }
    }

    #[test]
    fn prefetcher_drains_the_full_order() {
        let dir = tempdir().unwrap();
        write_solid(dir.path(), "a", [255, 255, 255]);
        write_solid(dir.path(), "b", [255, 255, 255]);
        let dataset = Dataset::from_records(vec![record("a", "X"), record("b", "Y")]);
        let sampler = Arc::new(ImageSampler::new(dir.path(), &dataset, png_config()));
        let order = sampler.shuffled_indices(0);
        let prefetcher = SamplePrefetcher::new(Arc::clone(&sampler), order.clone(), 2);
        let mut drained = 0;
        while let Some(result) = prefetcher.next() {
            result.unwrap();
            drained += 1;
        }
        assert_eq!(drained, order.len());
        assert_eq!(prefetcher.produced_count(), order.len());
        assert_eq!(prefetcher.error_count(), 0);
    }
}
