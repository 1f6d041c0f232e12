use super::*;
use crate::foundation::error::BezelError;

#[test]
fn computes_once_per_key() {
    let mut cache: Box<dyn KeyedCache<u32>> = Box::new(MemoryCache::new());
    let mut calls = 0;

    let a = cache
        .get_or_try_insert_with("a", || {
            calls += 1;
            Ok(7)
        })
        .unwrap();
    let b = cache
        .get_or_try_insert_with("a", || {
            calls += 1;
            Ok(8)
        })
        .unwrap();

    assert_eq!((*a, *b), (7, 7));
    assert_eq!(calls, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn failed_compute_is_not_cached() {
    let mut cache: Box<dyn KeyedCache<u32>> = Box::new(MemoryCache::new());
    let err = cache
        .get_or_try_insert_with("k", || Err(BezelError::data("nope")))
        .unwrap_err();
    assert!(matches!(err, BezelError::Data(_)));
    assert!(cache.is_empty());
    assert_eq!(*cache.get_or_try_insert_with("k", || Ok(1)).unwrap(), 1);
}
