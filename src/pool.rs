use std::cell::RefCell;
use std::ops::AddAssign;

use rayon::prelude::*;
use thread_local::ThreadLocal;

/// Lazily materializes one `T` per worker thread on first [`get`](Self::get)
/// and merges them with [`merge`](Self::merge). No thread identity ever
/// leaks to the caller — callers only ever see `&RefCell<T>` or the merged
/// `T`.
///
/// Construction takes an `init` closure rather than requiring `T: Default`
/// — the histogram containers this wraps ([`crate::distribution`]) need a
/// bin count and ff count to build their zero value, neither of which a
/// bare `Default::default()` could supply.
///
/// Grounded on spec.md §9's `ThreadLocalWrapper<T>` redesign note; backed
/// by the `thread_local` crate rather than a hand-rolled thread-id map.
pub struct ThreadLocalWrapper<T: Send> {
    local: ThreadLocal<RefCell<T>>,
    init: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Send> ThreadLocalWrapper<T> {
    pub fn new(init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            local: ThreadLocal::new(),
            init: Box::new(init),
        }
    }

    /// The current worker's accumulator, created via `init` the first time
    /// this worker calls it.
    pub fn get(&self) -> &RefCell<T> {
        self.local.get_or(|| RefCell::new((self.init)()))
    }

    /// Merges every per-worker copy into `zero` in a single pass, without
    /// ever holding more than the running total and the instance being
    /// folded in at once.
    pub fn merge(mut self, zero: T) -> T
    where
        for<'a> T: AddAssign<&'a T>,
    {
        let mut total = zero;
        for cell in self.local.iter_mut() {
            total += &*cell.borrow();
        }
        total
    }
}

/// The process-wide parallel worker pool spec.md §5 describes: a
/// fixed-size pool, tasks submitted as independent closures, a single
/// `wait()` barrier at the end of each phase. Backed by a `rayon`
/// thread pool — rayon's `install`/`par_chunks` already give exactly
/// this "submit, then barrier" shape, so no custom scheduler is needed.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// `num_threads = None` defaults to hardware concurrency, matching
    /// spec.md §5.
    pub fn new(num_threads: Option<usize>) -> Self {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .expect("failed to build the histogram engine's worker pool");
        Self { pool }
    }

    /// Splits `items` into `job_size`-sized slices and runs `f` on each
    /// slice across the pool, blocking until every slice has completed
    /// (the phase's `wait()` barrier).
    pub fn for_each_chunk<T, F>(&self, items: &[T], job_size: usize, f: F)
    where
        T: Sync,
        F: Fn(&[T]) + Sync,
    {
        self.pool.install(|| {
            items.par_chunks(job_size.max(1)).for_each(f);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter(u64);

    impl AddAssign<&Counter> for Counter {
        fn add_assign(&mut self, rhs: &Counter) {
            self.0 += rhs.0;
        }
    }

    #[test]
    fn merge_sums_across_threads() {
        let wrapper: ThreadLocalWrapper<Counter> = ThreadLocalWrapper::new(|| Counter(0));
        let pool = WorkerPool::new(Some(4));
        let items: Vec<u64> = (0..1000).collect();
        pool.for_each_chunk(&items, 10, |chunk| {
            wrapper.get().borrow_mut().0 += chunk.len() as u64;
        });
        let merged = wrapper.merge(Counter(0));
        assert_eq!(merged.0, 1000);
    }
}
