//! Request-scoped diagnostic context.
//!
//! A small string map that lives in Tokio task-local storage for the duration
//! of one request future. Entries never outlive their scope, and a scope is
//! never shared with another task, so concurrent requests on the same worker
//! thread cannot see each other's values.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

tokio::task_local! {
    static DIAGNOSTIC_CONTEXT: RefCell<BTreeMap<String, String>>;
}

/// Key under which the request-context middleware stores the request URI.
pub const URI_KEY: &str = "uri";

/// Run `fut` inside a fresh, empty diagnostic context.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    DIAGNOSTIC_CONTEXT
        .scope(RefCell::new(BTreeMap::new()), fut)
        .await
}

/// Returns true when the current task has a diagnostic context.
pub fn in_scope() -> bool {
    DIAGNOSTIC_CONTEXT.try_with(|_| ()).is_ok()
}

/// Set `key` to `value`. Returns false when called outside a scope.
pub fn put(key: &str, value: impl Into<String>) -> bool {
    let value = value.into();
    DIAGNOSTIC_CONTEXT
        .try_with(|ctx| {
            ctx.borrow_mut().insert(key.to_string(), value);
        })
        .is_ok()
}

pub fn get(key: &str) -> Option<String> {
    DIAGNOSTIC_CONTEXT
        .try_with(|ctx| ctx.borrow().get(key).cloned())
        .ok()
        .flatten()
}

/// Remove `key`, returning its previous value.
pub fn remove(key: &str) -> Option<String> {
    DIAGNOSTIC_CONTEXT
        .try_with(|ctx| ctx.borrow_mut().remove(key))
        .ok()
        .flatten()
}

/// Copy of every entry in the current scope (empty outside a scope).
pub fn snapshot() -> BTreeMap<String, String> {
    DIAGNOSTIC_CONTEXT
        .try_with(|ctx| ctx.borrow().clone())
        .unwrap_or_default()
}

/// Set `key` for the duration of `fut` and remove it afterwards, whether `fut`
/// completes, is dropped, or unwinds.
///
/// Reuses the enclosing scope when there is one; otherwise a new scope is
/// opened around `fut`.
pub async fn scoped_entry<F: Future>(key: &'static str, value: String, fut: F) -> F::Output {
    if in_scope() {
        with_entry(key, value, fut).await
    } else {
        scope(with_entry(key, value, fut)).await
    }
}

async fn with_entry<F: Future>(key: &'static str, value: String, fut: F) -> F::Output {
    put(key, value);
    let _guard = RemoveOnDrop(key);
    fut.await
}

struct RemoveOnDrop(&'static str);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        remove(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;
    use std::time::Duration;

    #[test]
    fn test_outside_scope_is_inert() {
        assert!(!in_scope());
        assert!(!put("uri", "/x"));
        assert_eq!(get("uri"), None);
        assert_eq!(remove("uri"), None);
        assert!(snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        scope(async {
            assert!(put("uri", "/a"));
            assert_eq!(get("uri").as_deref(), Some("/a"));
            assert_eq!(remove("uri").as_deref(), Some("/a"));
            assert_eq!(get("uri"), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_scoped_entry_visible_inside_and_removed_after() {
        scope(async {
            let seen = scoped_entry(URI_KEY, "/x".to_string(), async { get(URI_KEY) }).await;
            assert_eq!(seen.as_deref(), Some("/x"));
            assert_eq!(get(URI_KEY), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_scoped_entry_removed_on_panic() {
        scope(async {
            let result = AssertUnwindSafe(scoped_entry(URI_KEY, "/x".to_string(), async {
                assert_eq!(get(URI_KEY).as_deref(), Some("/x"));
                panic!("downstream failure");
            }))
            .catch_unwind()
            .await;

            assert!(result.is_err());
            assert_eq!(get(URI_KEY), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_scoped_entry_opens_scope_when_missing() {
        let seen = scoped_entry(URI_KEY, "/y".to_string(), async { snapshot() }).await;
        assert_eq!(seen.get(URI_KEY).map(String::as_str), Some("/y"));
        assert!(!in_scope());
    }

    #[tokio::test]
    async fn test_other_keys_survive_entry_removal() {
        scope(async {
            put("tenant", "acme");
            scoped_entry(URI_KEY, "/z".to_string(), async {}).await;
            assert_eq!(get("tenant").as_deref(), Some("acme"));
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_scopes_are_isolated() {
        let observe = |uri: &'static str| {
            tokio::spawn(scoped_entry(URI_KEY, uri.to_string(), async move {
                for _ in 0..10 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    assert_eq!(get(URI_KEY).as_deref(), Some(uri));
                }
                get(URI_KEY)
            }))
        };

        let (a, b) = tokio::join!(observe("/a"), observe("/b"));
        assert_eq!(a.unwrap().as_deref(), Some("/a"));
        assert_eq!(b.unwrap().as_deref(), Some("/b"));
    }
}
