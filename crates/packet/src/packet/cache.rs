use std::convert::Infallible;
use std::sync::OnceLock;

/// Observable state of a [`Memo`].
#[derive(Debug, PartialEq, Eq)]
pub enum CacheState<'a, T, E> {
    NotComputed,
    Computed(&'a T),
    Failed(&'a E),
}

/// Compute-once cell with an explicit failed state.
///
/// The first caller runs the computation; its outcome, success or failure,
/// is kept for the life of the cell and never reverts. Concurrent first
/// callers block on the one running computation.
#[derive(Debug)]
pub struct Memo<T, E = Infallible> {
    cell: OnceLock<Result<T, E>>,
}

impl<T, E> Memo<T, E> {
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// A cell whose outcome is already known.
    pub fn seeded(outcome: Result<T, E>) -> Self {
        Self { cell: OnceLock::from(outcome) }
    }

    pub fn get_or_compute<F>(&self, compute: F) -> Result<&T, &E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.cell.get_or_init(compute).as_ref()
    }

    pub fn state(&self) -> CacheState<'_, T, E> {
        match self.cell.get() {
            None => CacheState::NotComputed,
            Some(Ok(value)) => CacheState::Computed(value),
            Some(Err(err)) => CacheState::Failed(err),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Memo<T, Infallible> {
    pub fn get_or_init<F>(&self, compute: F) -> &T
    where
        F: FnOnce() -> T,
    {
        match self.cell.get_or_init(|| Ok(compute())) {
            Ok(value) => value,
            Err(never) => match *never {},
        }
    }
}

impl<T, E> Default for Memo<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
