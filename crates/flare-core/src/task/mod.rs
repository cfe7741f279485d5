// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A blocking fork-join `parallel_for` over index ranges and slices.
//!
//! Work below [`ParallelForParams::bin_size`] runs inline on the caller.
//! Larger work is cut into contiguous slices of at least `bin_size` elements,
//! capped at `threads * max_tasks_per_thread` slices, and scheduled on the
//! global `rayon` pool. Both entry points return only once every slice has
//! completed.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Whether a parallel-for may fan out again when called from a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskNesting {
    /// Nested calls fan out like top-level ones.
    #[default]
    Allowed,
    /// Nested calls run inline on the worker that issued them.
    Never,
}

/// Scheduling hint carried with a parallel-for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Background work.
    Low,
    /// Regular per-frame work.
    #[default]
    Normal,
    /// Work on the frame's critical path.
    High,
}

/// Parameters controlling how a parallel-for splits its work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelForParams {
    /// Minimum number of elements per slice. Ranges no longer than this run inline.
    pub bin_size: usize,
    /// Upper bound on slices per worker thread.
    pub max_tasks_per_thread: usize,
    /// Nesting policy.
    pub nesting: TaskNesting,
    /// Priority hint.
    pub priority: TaskPriority,
}

impl Default for ParallelForParams {
    fn default() -> Self {
        Self {
            bin_size: 64,
            max_tasks_per_thread: 4,
            nesting: TaskNesting::Allowed,
            priority: TaskPriority::Normal,
        }
    }
}

impl ParallelForParams {
    /// Returns a copy with a different bin size.
    pub fn with_bin_size(mut self, bin_size: usize) -> Self {
        self.bin_size = bin_size;
        self
    }

    /// Returns how many slices to cut `len` elements into, or `None` to run inline.
    fn slice_count(&self, len: usize) -> Option<usize> {
        let bin_size = self.bin_size.max(1);
        if len <= bin_size {
            return None;
        }
        if self.nesting == TaskNesting::Never && rayon::current_thread_index().is_some() {
            return None;
        }

        let max_slices = (rayon::current_num_threads() * self.max_tasks_per_thread.max(1)).max(1);
        let slices = (len / bin_size).clamp(1, max_slices);
        (slices > 1).then_some(slices)
    }
}

/// Bounds of slice `index` when `len` elements are cut into `slices` pieces.
///
/// Pieces differ in length by at most one, the longer ones first, so none is
/// shorter than `len / slices`.
fn slice_bounds(len: usize, slices: usize, index: usize) -> Range<usize> {
    let base = len / slices;
    let extra = len % slices;
    let start = index * base + index.min(extra);
    let end = start + base + usize::from(index < extra);
    start..end
}

/// Runs `body(slice_index, sub_range)` over contiguous pieces of `range`.
///
/// Blocks until every piece has run. The pieces are disjoint and cover
/// `range` exactly.
pub fn parallel_for_range<F>(range: Range<usize>, params: &ParallelForParams, body: F)
where
    F: Fn(usize, Range<usize>) + Send + Sync,
{
    let len = range.len();
    if len == 0 {
        return;
    }

    let Some(slices) = params.slice_count(len) else {
        body(0, range);
        return;
    };

    log::trace!(
        "parallel_for_range: {len} elements in {slices} slices ({:?} priority).",
        params.priority
    );

    (0..slices).into_par_iter().for_each(|slice_index| {
        let bounds = slice_bounds(len, slices, slice_index);
        body(slice_index, range.start + bounds.start..range.start + bounds.end);
    });
}

/// Runs `body(first_index, chunk)` over disjoint mutable chunks of `items`.
///
/// `first_index` is the position of `chunk[0]` within `items`. Blocks until
/// every chunk has run.
pub fn parallel_for_slice_mut<T, F>(items: &mut [T], params: &ParallelForParams, body: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if items.is_empty() {
        return;
    }

    let len = items.len();
    let Some(slices) = params.slice_count(len) else {
        body(0, items);
        return;
    };

    log::trace!(
        "parallel_for_slice_mut: {len} elements in {slices} chunks ({:?} priority).",
        params.priority
    );

    let mut chunks = Vec::with_capacity(slices);
    let mut rest = items;
    for slice_index in 0..slices {
        let bounds = slice_bounds(len, slices, slice_index);
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(bounds.len());
        chunks.push((bounds.start, chunk));
        rest = tail;
    }

    chunks
        .into_par_iter()
        .for_each(|(first_index, chunk)| body(first_index, chunk));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn small_ranges_run_inline_as_one_piece() {
        let pieces = Mutex::new(Vec::new());
        parallel_for_range(3..10, &ParallelForParams::default(), |index, range| {
            pieces.lock().unwrap().push((index, range));
        });
        assert_eq!(pieces.into_inner().unwrap(), vec![(0, 3..10)]);
    }

    #[test]
    fn pieces_cover_range_exactly_once() {
        let params = ParallelForParams::default().with_bin_size(16);
        let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();

        parallel_for_range(0..1000, &params, |_, range| {
            assert!(range.len() >= 1);
            for i in range {
                hits[i].fetch_add(1, Ordering::Relaxed);
            }
        });

        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn slice_chunks_report_their_offset() {
        let params = ParallelForParams::default().with_bin_size(8);
        let mut values = vec![0usize; 500];

        parallel_for_slice_mut(&mut values, &params, |first, chunk| {
            for (offset, v) in chunk.iter_mut().enumerate() {
                *v = first + offset;
            }
        });

        assert!(values.iter().enumerate().all(|(i, v)| i == *v));
    }

    #[test]
    fn slices_never_fall_below_bin_size() {
        let params = ParallelForParams::default().with_bin_size(10);
        let lengths = Mutex::new(Vec::new());
        parallel_for_range(0..105, &params, |_, range| {
            lengths.lock().unwrap().push(range.len());
        });
        let lengths = lengths.into_inner().unwrap();
        assert_eq!(lengths.iter().sum::<usize>(), 105);
        assert!(lengths.iter().all(|len| *len >= 10), "{lengths:?}");

        let chunk_lengths = Mutex::new(Vec::new());
        let mut values = vec![0u8; 105];
        parallel_for_slice_mut(&mut values, &params, |_, chunk| {
            chunk_lengths.lock().unwrap().push(chunk.len());
        });
        assert!(chunk_lengths.into_inner().unwrap().iter().all(|len| *len >= 10));
    }

    #[test]
    fn slice_bounds_are_balanced_and_contiguous() {
        for (len, slices) in [(105, 10), (105, 8), (64, 4), (11, 2)] {
            let bounds: Vec<Range<usize>> =
                (0..slices).map(|i| slice_bounds(len, slices, i)).collect();
            assert_eq!(bounds[0].start, 0);
            assert_eq!(bounds[slices - 1].end, len);
            assert!(bounds.windows(2).all(|pair| pair[0].end == pair[1].start));
            assert!(bounds.iter().all(|b| b.len() >= len / slices));
            assert!(bounds.iter().all(|b| b.len() <= len / slices + 1));
        }
        assert_eq!(slice_bounds(105, 10, 0), 0..11);
        assert_eq!(slice_bounds(105, 10, 9), 95..105);
    }

    #[test]
    fn empty_input_never_calls_body() {
        let calls = AtomicUsize::new(0);
        parallel_for_range(5..5, &ParallelForParams::default(), |_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        let mut empty: [u8; 0] = [];
        parallel_for_slice_mut(&mut empty, &ParallelForParams::default(), |_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: ParallelForParams =
            ron::from_str("(bin_size: 32, nesting: Never)").expect("valid RON");
        assert_eq!(params.bin_size, 32);
        assert_eq!(params.nesting, TaskNesting::Never);
        assert_eq!(params.max_tasks_per_thread, 4);
    }
}
