use std::sync::Arc;

use parking_lot::RwLock;

/// Single-writer handle whose whole value is replaced at once.
///
/// Readers get an `Arc` to either the previous or the new value, never a
/// value that is still being built.
#[derive(Debug)]
pub struct Shared<T> {
    inner: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared { inner: self.inner.clone() }
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Shared<T> {
        Shared { inner: Arc::new(RwLock::new(Arc::new(value))) }
    }

    pub fn get(&self) -> Arc<T> {
        self.inner.read().clone()
    }

    pub fn replace(&self, value: T) {
        let value = Arc::new(value);
        *self.inner.write() = value;
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}
