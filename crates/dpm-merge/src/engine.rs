//! K-way merge by `(key, time)` with patient-boundary detection.
//!
//! The engine keeps one head per input stream (the frontier) and repeatedly
//! emits the smallest head. Selection is a linear scan over the frontier in
//! stream order, so exact ties on `(key, time)` always go to the lowest
//! stream index. That keeps output byte-for-byte reproducible.
//!
//! After each emission the engine checks whether any remaining head still
//! carries the emitted key. When none does, the patient group is closed.
//!
//! # Example
//!
//! ```
//! use dpm_merge::MergeEngine;
//!
//! let engine = MergeEngine::new(vec![
//!     vec![("p1", 1), ("p1", 3), ("p2", 5)],
//!     vec![("p1", 2)],
//!     vec![],
//!     vec![("p2", 4)],
//! ])
//! .unwrap();
//! let groups: Vec<_> = engine.collect::<Result<_, _>>().unwrap();
//! assert_eq!(groups.len(), 2);
//! ```

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::error::{MergeError, Result};
use crate::group::{Emitted, PatientGroup};
use crate::record::MergeRecord;
use crate::sink::GroupSink;
use crate::stream::SortedStream;

/// One emission of the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep<E> {
    /// Index of the stream the event was drawn from.
    pub stream: usize,
    pub event: E,
    /// True when this was the last event of its patient.
    pub closes_group: bool,
}

/// Counts gathered over a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub events: usize,
    pub groups: usize,
    /// Events emitted per input stream, by stream index.
    pub per_stream: Vec<usize>,
}

pub struct MergeEngine<I: Iterator> {
    frontier: Vec<SortedStream<I>>,
    per_stream: Vec<usize>,
    groups: usize,
    failed: bool,
}

impl<I> MergeEngine<I>
where
    I: Iterator,
    I::Item: MergeRecord,
{
    /// Build an engine over `sources`, numbering streams in iteration order.
    ///
    /// Empty sources start out exhausted and never contribute.
    pub fn new<S, T>(sources: S) -> Result<Self>
    where
        S: IntoIterator<Item = T>,
        T: IntoIterator<IntoIter = I>,
    {
        let frontier = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| SortedStream::new(index, source))
            .collect::<Result<Vec<_>>>()?;
        let per_stream = vec![0; frontier.len()];
        Ok(Self {
            frontier,
            per_stream,
            groups: 0,
            failed: false,
        })
    }

    pub fn stream_count(&self) -> usize {
        self.frontier.len()
    }

    /// The stream at `index`, if any.
    pub fn stream(&self, index: usize) -> Option<&SortedStream<I>> {
        self.frontier.get(index)
    }

    /// True once every stream is exhausted.
    pub fn is_finished(&self) -> bool {
        self.frontier.iter().all(SortedStream::is_exhausted)
    }

    /// Index of the stream whose head has the smallest `(key, time)`.
    ///
    /// Returns `Ok(None)` when the merge is finished, and the stream's error
    /// when any stream has failed.
    pub fn select_minimum(&self) -> Result<Option<usize>> {
        if let Some(error) = self.frontier.iter().find_map(SortedStream::failure) {
            return Err(error);
        }
        let mut best: Option<(usize, &I::Item)> = None;
        for stream in &self.frontier {
            let Some(candidate) = stream.peek() else {
                continue;
            };
            let replace = match best {
                None => true,
                Some((_, current)) => precedes(candidate, current).ok_or_else(|| {
                    MergeError::MalformedEvent {
                        stream: stream.index(),
                        index: stream.position().unwrap_or_default(),
                        detail: format!(
                            "timestamp {:?} cannot be ordered against {:?}",
                            candidate.time(),
                            current.time()
                        ),
                    }
                })?,
            };
            if replace {
                best = Some((stream.index(), candidate));
            }
        }
        Ok(best.map(|(index, _)| index))
    }

    /// Emit the smallest head and advance its stream.
    ///
    /// Returns `Ok(None)` when every stream is exhausted. Once a stream has
    /// hit a malformed event every call returns that error again.
    pub fn step(&mut self) -> Result<Option<MergeStep<I::Item>>> {
        let Some(index) = self.select_minimum()? else {
            return Ok(None);
        };
        let event = self.frontier[index].advance()?;
        self.per_stream[index] += 1;
        let closes_group = !self
            .frontier
            .iter()
            .any(|stream| stream.peek().is_some_and(|head| head.key() == event.key()));
        Ok(Some(MergeStep {
            stream: index,
            event,
            closes_group,
        }))
    }

    /// Run the merge until the next patient group closes.
    pub fn next_group(&mut self) -> Result<Option<PatientGroup<I::Item>>> {
        let mut open: Option<PatientGroup<I::Item>> = None;
        while let Some(MergeStep {
            stream,
            event,
            closes_group,
        }) = self.step()?
        {
            let group = open.get_or_insert_with(|| PatientGroup::open(event.key().clone()));
            group.events.push(Emitted { stream, event });
            if closes_group {
                self.groups += 1;
                trace!(events = group.len(), "patient group closed");
                return Ok(open);
            }
        }
        Ok(open)
    }

    /// Drive the merge to completion, handing each closed group to `sink`.
    pub fn run<S>(mut self, mut sink: S) -> Result<MergeSummary>
    where
        S: GroupSink<I::Item>,
    {
        while let Some(group) = self.next_group()? {
            sink.on_patient_group_closed(group)
                .map_err(|error| MergeError::Sink(Box::new(error)))?;
        }
        let summary = self.summary();
        debug!(
            streams = self.frontier.len(),
            events = summary.events,
            groups = summary.groups,
            "merge complete"
        );
        Ok(summary)
    }

    /// Counts so far.
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            events: self.per_stream.iter().sum(),
            groups: self.groups,
            per_stream: self.per_stream.clone(),
        }
    }
}

impl<I> Iterator for MergeEngine<I>
where
    I: Iterator,
    I::Item: MergeRecord,
{
    type Item = Result<PatientGroup<I::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_group().transpose();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}

/// Whether `candidate` sorts strictly before `current`.
///
/// `None` means the timestamps could not be compared.
fn precedes<E: MergeRecord>(candidate: &E, current: &E) -> Option<bool> {
    match candidate.key().cmp(current.key()) {
        Ordering::Less => Some(true),
        Ordering::Greater => Some(false),
        Ordering::Equal => candidate
            .time()
            .partial_cmp(current.time())
            .map(|ordering| ordering == Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Event = (&'static str, i64, char);

    fn engine(sources: Vec<Vec<Event>>) -> MergeEngine<std::vec::IntoIter<Event>> {
        MergeEngine::new(sources).expect("engine")
    }

    #[test]
    fn ties_go_to_lowest_stream_index() {
        let mut merge = engine(vec![vec![("p1", 5, 'a')], vec![("p1", 5, 'b')]]);
        assert_eq!(merge.select_minimum().expect("select"), Some(0));
        let first = merge.step().expect("step").expect("event");
        assert_eq!(first.event.2, 'a');
        assert!(!first.closes_group);
        let second = merge.step().expect("step").expect("event");
        assert_eq!(second.event.2, 'b');
        assert!(second.closes_group);
        assert!(merge.step().expect("step").is_none());
    }

    #[test]
    fn key_takes_precedence_over_time() {
        let merge = engine(vec![vec![("p2", 1, 'a')], vec![("p1", 9, 'b')]]);
        assert_eq!(merge.select_minimum().expect("select"), Some(1));
    }

    #[test]
    fn all_empty_streams_finish_immediately() {
        let mut merge = engine(vec![vec![], vec![], vec![]]);
        assert!(merge.is_finished());
        assert_eq!(merge.select_minimum().expect("select"), None);
        assert!(merge.next_group().expect("group").is_none());
        assert_eq!(merge.summary().per_stream, vec![0, 0, 0]);
    }

    #[test]
    fn zero_streams_is_a_finished_merge() {
        let mut merge = engine(Vec::new());
        assert_eq!(merge.stream_count(), 0);
        assert!(merge.next().is_none());
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut merge = MergeEngine::new(vec![
            vec![("p1", 1.0), ("p1", f64::NAN)],
            vec![("p1", 2.0)],
        ])
        .expect("engine");
        assert!(matches!(
            merge.next(),
            Some(Err(MergeError::MalformedEvent { stream: 0, .. }))
        ));
        assert!(merge.next().is_none());
    }
}
