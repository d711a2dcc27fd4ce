//! Cursor over one pre-sorted event sequence.

use std::iter::Fuse;

use crate::error::{MergeError, Result};
use crate::record::{MergeRecord, check_orderable};

enum Head<E> {
    Active { event: E, position: usize },
    /// The event at `position` could not be ordered. Terminal, like
    /// `Exhausted`, but never mistaken for a drained source.
    Failed { position: usize, detail: String },
    Exhausted,
}

/// One input stream of the merge.
///
/// The stream holds exactly one buffered event (its head) and pulls the next
/// one from the source on [`advance`](Self::advance). Once the source runs
/// dry the stream is exhausted for good. A malformed event puts the stream
/// in a failed state instead, and every later call reports the same error.
pub struct SortedStream<I: Iterator> {
    index: usize,
    source: Fuse<I>,
    head: Head<I::Item>,
}

impl<I> SortedStream<I>
where
    I: Iterator,
    I::Item: MergeRecord,
{
    /// Wrap a source already sorted by `(key, time)`.
    ///
    /// `index` identifies the stream in errors and decides ties. Fails if the
    /// first event cannot be ordered.
    pub fn new<S>(index: usize, source: S) -> Result<Self>
    where
        S: IntoIterator<IntoIter = I>,
    {
        let mut source = source.into_iter().fuse();
        let head = Self::load(&mut source, 0);
        let stream = Self {
            index,
            source,
            head,
        };
        match stream.failure() {
            Some(error) => Err(error),
            None => Ok(stream),
        }
    }

    fn load(source: &mut Fuse<I>, position: usize) -> Head<I::Item> {
        match source.next() {
            Some(event) => match check_orderable(&event) {
                Some(detail) => Head::Failed { position, detail },
                None => Head::Active { event, position },
            },
            None => Head::Exhausted,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The current head, or `None` once exhausted.
    pub fn peek(&self) -> Option<&I::Item> {
        match &self.head {
            Head::Active { event, .. } => Some(event),
            Head::Failed { .. } | Head::Exhausted => None,
        }
    }

    /// Position of the head within the source, `None` once exhausted.
    pub fn position(&self) -> Option<usize> {
        match &self.head {
            Head::Active { position, .. } | Head::Failed { position, .. } => Some(*position),
            Head::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.head, Head::Exhausted)
    }

    /// The error that stopped this stream, if a malformed event was reached.
    pub fn failure(&self) -> Option<MergeError> {
        match &self.head {
            Head::Failed { position, detail } => Some(MergeError::MalformedEvent {
                stream: self.index,
                index: *position,
                detail: detail.clone(),
            }),
            Head::Active { .. } | Head::Exhausted => None,
        }
    }

    /// Consume and return the head.
    ///
    /// # Errors
    ///
    /// `Precondition` if the stream is already exhausted, `MalformedEvent` if
    /// the event that becomes the new head cannot be ordered. After a
    /// `MalformedEvent` the stream stays failed.
    pub fn advance(&mut self) -> Result<I::Item> {
        match std::mem::replace(&mut self.head, Head::Exhausted) {
            Head::Active { event, position } => {
                self.head = Self::load(&mut self.source, position + 1);
                match self.failure() {
                    Some(error) => Err(error),
                    None => Ok(event),
                }
            }
            failed @ Head::Failed { .. } => {
                self.head = failed;
                Err(self.failure().unwrap_or(MergeError::Precondition { stream: self.index }))
            }
            Head::Exhausted => Err(MergeError::Precondition { stream: self.index }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(events: Vec<(&'static str, i64)>) -> SortedStream<std::vec::IntoIter<(&'static str, i64)>> {
        SortedStream::new(0, events).expect("stream")
    }

    #[test]
    fn peek_is_idempotent() {
        let s = stream(vec![("p1", 1), ("p1", 2)]);
        let first = s.peek().copied();
        for _ in 0..5 {
            assert_eq!(s.peek().copied(), first);
        }
        assert_eq!(first, Some(("p1", 1)));
    }

    #[test]
    fn advance_walks_then_exhausts() {
        let mut s = stream(vec![("p1", 1), ("p2", 1)]);
        assert_eq!(s.position(), Some(0));
        assert_eq!(s.advance().expect("advance"), ("p1", 1));
        assert_eq!(s.position(), Some(1));
        assert_eq!(s.advance().expect("advance"), ("p2", 1));
        assert!(s.is_exhausted());
        assert_eq!(s.peek(), None);
    }

    #[test]
    fn advancing_exhausted_stream_is_a_precondition_error() {
        let mut s = SortedStream::new(3, Vec::<(&str, i64)>::new()).expect("stream");
        assert!(s.is_exhausted());
        let err = s.advance().expect_err("exhausted");
        assert!(matches!(err, MergeError::Precondition { stream: 3 }));
        // Still exhausted afterwards.
        assert!(s.peek().is_none());
    }

    #[test]
    fn nan_head_is_rejected_when_loaded() {
        let mut s = SortedStream::new(1, vec![("p1", 1.0), ("p1", f64::NAN)]).expect("stream");
        let err = s.advance().expect_err("malformed");
        assert!(matches!(
            err,
            MergeError::MalformedEvent {
                stream: 1,
                index: 1,
                ..
            }
        ));
        assert!(!s.is_exhausted());
        assert!(s.peek().is_none());
        assert_eq!(s.position(), Some(1));
        let again = s.advance().expect_err("still failed");
        assert!(matches!(
            again,
            MergeError::MalformedEvent {
                stream: 1,
                index: 1,
                ..
            }
        ));
    }
}
