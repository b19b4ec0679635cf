//! Generic primary/secondary fallback resolution.
//!
//! Every multi-source operation reduces to one of three shapes: merge a
//! secondary record into an incomplete primary record field-by-field,
//! take the first non-empty series, or prefer a complete primary list.
//! Provider errors are absorbed into `None`/empty results here; callers
//! only see hard errors from their own misuse.

use analyzer_core::Result;
use std::future::Future;
use tracing::{debug, warn};

/// Resolve a single record with field-level merging.
///
/// The primary wins outright when it satisfies `is_complete`; the
/// secondary future is then never polled. An incomplete primary is merged
/// with the secondary via `merge`, which must only fill gaps. A failed or
/// empty primary falls back to the secondary alone.
pub(crate) async fn resolve_merged<T, P, S>(
    op: &'static str,
    primary: Option<P>,
    secondary: Option<S>,
    is_complete: impl Fn(&T) -> bool,
    merge: impl FnOnce(&mut T, &T),
) -> Option<T>
where
    P: Future<Output = Result<Option<T>>>,
    S: Future<Output = Result<Option<T>>>,
{
    let primary_value = match primary {
        Some(fut) => match fut.await {
            Ok(value) => value,
            Err(e) => {
                warn!(op, error = %e, "primary provider failed");
                None
            }
        },
        None => None,
    };

    if let Some(value) = &primary_value
        && is_complete(value)
    {
        return primary_value;
    }

    let secondary_value = match secondary {
        Some(fut) => match fut.await {
            Ok(value) => value,
            Err(e) => {
                warn!(op, error = %e, "secondary provider failed");
                None
            }
        },
        None => None,
    };

    match (primary_value, secondary_value) {
        (Some(mut value), Some(extra)) => {
            debug!(op, "merging secondary fields into incomplete primary");
            merge(&mut value, &extra);
            Some(value)
        }
        (Some(value), None) => Some(value),
        (None, fallback) => fallback,
    }
}

/// Resolve a series by whole-result fallback: the first provider that
/// returns a non-empty result wins.
pub(crate) async fn resolve_first<T, P, S>(
    op: &'static str,
    primary: Option<P>,
    secondary: Option<S>,
) -> Vec<T>
where
    P: Future<Output = Result<Vec<T>>>,
    S: Future<Output = Result<Vec<T>>>,
{
    if let Some(fut) = primary {
        match fut.await {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => debug!(op, "primary returned no rows, trying secondary"),
            Err(e) => warn!(op, error = %e, "primary provider failed, trying secondary"),
        }
    }

    if let Some(fut) = secondary {
        match fut.await {
            Ok(items) => return items,
            Err(e) => warn!(op, error = %e, "secondary provider failed"),
        }
    }

    Vec::new()
}

/// Resolve a list where an incomplete primary is replaced wholesale.
///
/// A complete primary list wins. Otherwise a non-empty secondary replaces
/// it; an empty or failed secondary leaves whatever the primary produced.
pub(crate) async fn resolve_list<T, P, S>(
    op: &'static str,
    primary: Option<P>,
    secondary: Option<S>,
    is_complete: impl Fn(&[T]) -> bool,
) -> Vec<T>
where
    P: Future<Output = Result<Vec<T>>>,
    S: Future<Output = Result<Vec<T>>>,
{
    let primary_items = match primary {
        Some(fut) => match fut.await {
            Ok(items) => items,
            Err(e) => {
                warn!(op, error = %e, "primary provider failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    if is_complete(&primary_items) {
        return primary_items;
    }

    if let Some(fut) = secondary {
        match fut.await {
            Ok(items) if !items.is_empty() => {
                debug!(op, "incomplete primary list replaced by secondary");
                return items;
            }
            Ok(_) => {}
            Err(e) => warn!(op, error = %e, "secondary provider failed"),
        }
    }

    primary_items
}
