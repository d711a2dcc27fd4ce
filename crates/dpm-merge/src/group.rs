use crate::record::MergeRecord;

/// An event together with the stream it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted<E> {
    pub stream: usize,
    pub event: E,
}

/// All events of one patient, in merge order.
///
/// A group is closed as soon as no stream head carries its key any more, so
/// every key appears in exactly one group.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientGroup<E: MergeRecord> {
    pub key: E::Key,
    pub events: Vec<Emitted<E>>,
}

impl<E: MergeRecord> PatientGroup<E> {
    pub(crate) fn open(key: E::Key) -> Self {
        Self {
            key,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events without their source stream index.
    pub fn iter_events(&self) -> impl Iterator<Item = &E> {
        self.events.iter().map(|emitted| &emitted.event)
    }

    pub fn into_events(self) -> Vec<E> {
        self.events.into_iter().map(|emitted| emitted.event).collect()
    }
}
