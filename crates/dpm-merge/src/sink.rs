//! Consumers of closed patient groups.

use std::convert::Infallible;

use crate::group::PatientGroup;
use crate::record::MergeRecord;

/// Receives patient groups in the order the merge closes them.
///
/// Groups arrive in non-decreasing key order; a sink never sees the same key
/// twice.
pub trait GroupSink<E: MergeRecord> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn on_patient_group_closed(&mut self, group: PatientGroup<E>) -> Result<(), Self::Error>;
}

impl<E: MergeRecord> GroupSink<E> for Vec<PatientGroup<E>> {
    type Error = Infallible;

    fn on_patient_group_closed(&mut self, group: PatientGroup<E>) -> Result<(), Infallible> {
        self.push(group);
        Ok(())
    }
}

impl<E: MergeRecord, S: GroupSink<E>> GroupSink<E> for &mut S {
    type Error = S::Error;

    fn on_patient_group_closed(&mut self, group: PatientGroup<E>) -> Result<(), S::Error> {
        (**self).on_patient_group_closed(group)
    }
}
