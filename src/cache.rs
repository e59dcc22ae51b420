use std::sync::Arc;

use geo::Polygon;
use parking_lot::Mutex;
use tracing::trace;

use crate::Error;

/// A two-state slot holding a lazily computed polygon. Filling an empty slot
/// happens under the slot's lock, so concurrent readers see at most one
/// computation per fill.
#[derive(Debug, Default)]
pub struct PolygonCache {
    slot: Mutex<Option<Arc<Polygon<f64>>>>,
}

impl PolygonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached polygon, computing and storing it with `init` if
    /// the slot is empty.
    ///
    /// # Errors
    ///
    /// Propagates the error from `init`; the slot stays empty.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<Polygon<f64>>, Error>
    where
        F: FnOnce() -> Result<Polygon<f64>, Error>,
    {
        let mut slot = self.slot.lock();
        if let Some(polygon) = slot.as_ref() {
            return Ok(Arc::clone(polygon));
        }

        let polygon = Arc::new(init()?);
        trace!(vertices = polygon.exterior().0.len(), "Filled polygon cache");
        *slot = Some(Arc::clone(&polygon));
        Ok(polygon)
    }

    pub fn get(&self) -> Option<Arc<Polygon<f64>>> {
        self.slot.lock().clone()
    }

    /// Stores `polygon`, returning whatever was cached before.
    pub fn replace(&self, polygon: Arc<Polygon<f64>>) -> Option<Arc<Polygon<f64>>> {
        self.slot.lock().replace(polygon)
    }

    pub fn clear(&self) -> Option<Arc<Polygon<f64>>> {
        self.slot.lock().take()
    }

    pub fn is_populated(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Clone for PolygonCache {
    /// The clone shares the currently cached polygon, if any, but fills and
    /// replacements are independent from then on.
    fn clone(&self) -> Self {
        Self {
            slot: Mutex::new(self.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use geo::polygon;

    use super::*;

    fn triangle() -> Polygon<f64> {
        polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 0., y: 1.)]
    }

    #[test]
    fn fills_once() {
        let cache = PolygonCache::new();
        let calls = AtomicUsize::new(0);
        let init = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(triangle())
        };

        let first = cache.get_or_try_init(init).unwrap();
        let second = cache.get_or_try_init(init).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fill_leaves_slot_empty() {
        let cache = PolygonCache::new();
        let result = cache.get_or_try_init(|| Err(Error::InvalidParameter("nope".into())));
        assert!(result.is_err());
        assert!(!cache.is_populated());
    }

    #[test]
    fn concurrent_readers_share_one_fill() {
        let cache = PolygonCache::new();
        let calls = AtomicUsize::new(0);

        let polygons: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cache
                            .get_or_try_init(|| {
                                calls.fetch_add(1, Ordering::SeqCst);
                                Ok(triangle())
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(polygons.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn replace_swaps_the_cached_polygon() {
        let cache = PolygonCache::new();
        let old = cache.get_or_try_init(|| Ok(triangle())).unwrap();
        let new = Arc::new(triangle());

        let previous = cache.replace(Arc::clone(&new)).unwrap();
        assert!(Arc::ptr_eq(&previous, &old));
        assert!(Arc::ptr_eq(&cache.get().unwrap(), &new));
    }
}
