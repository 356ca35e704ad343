use crate::error::WorktreeResult;
use crate::mutation::Mutation;
use crate::progress::ProgressListener;

/// The sink that flushed mutation batches are applied to.
///
/// Implementations must satisfy these invariants:
/// - `mutations` is consumed at most once, in order.
/// - A call that returns `Err` leaves the tree as it was before the call.
/// - A call that returns `Ok` has applied every mutation in the sequence.
pub trait WorkingTree {
    /// Apply `mutations` as one batch, returning how many were applied.
    fn insert(
        &mut self,
        mutations: &mut dyn Iterator<Item = Mutation>,
        progress: &dyn ProgressListener,
    ) -> WorktreeResult<usize>;
}

impl<T: WorkingTree + ?Sized> WorkingTree for &mut T {
    fn insert(
        &mut self,
        mutations: &mut dyn Iterator<Item = Mutation>,
        progress: &dyn ProgressListener,
    ) -> WorktreeResult<usize> {
        (**self).insert(mutations, progress)
    }
}

impl<T: WorkingTree + ?Sized> WorkingTree for Box<T> {
    fn insert(
        &mut self,
        mutations: &mut dyn Iterator<Item = Mutation>,
        progress: &dyn ProgressListener,
    ) -> WorktreeResult<usize> {
        (**self).insert(mutations, progress)
    }
}
