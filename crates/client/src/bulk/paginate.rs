//! Keyset-pagination engine
//!
//! Repeatedly fetches pages of a remote collection, advancing a cursor
//! derived from the last item of each page. The cursor becomes the next
//! request's `startkey`, with a reserved high sentinel appended so the item
//! itself is excluded from the following page. `startkey` is used instead of
//! `skip` because the server evaluates it without walking the skipped rows.

use std::future::Future;

use davenport_domain::{DavenportError, Result};

use crate::query::QueryOptions;

/// Reserved high sentinel appended to cursor keys.
///
/// The sentinel sorts after any value a well-formed key contains, which makes
/// `startkey = last_key + SENTINEL` mean "strictly after the last seen item".
/// Collections whose natural keys contain U+FFF0 are outside the supported
/// domain: behaviour is undefined for them. This is a documented limitation
/// of the cursor scheme, not something the engine validates.
pub const CURSOR_SENTINEL: char = '\u{fff0}';

/// How [`paginate`] hands pages back to the caller.
pub enum PageConsumer<'a, T> {
    /// Accumulate every item and return the flattened collection. Memory
    /// grows with the total result size.
    Collect,
    /// Invoke the callback with each page and drop the page afterwards.
    /// Memory stays bounded by one page. An `Err` from the callback aborts
    /// pagination before the next fetch is issued; the in-flight request
    /// cannot be interrupted.
    Callback(&'a mut (dyn FnMut(Vec<T>) -> Result<()> + Send)),
}

/// Fetch every item of a remote collection, page by page.
///
/// Each iteration clones `options`, overwrites `limit` with `page_size` and,
/// once a cursor exists, overwrites `startkey` with it; all other caller
/// options pass through untouched. `cursor_key` extracts the next cursor
/// from the last item of each page.
///
/// An empty page is the **only** termination condition. A collection whose
/// size is an exact multiple of `page_size` therefore costs one extra
/// trailing fetch that confirms termination; completeness is worth the extra
/// round trip. Conversely, a fetch function that never returns an empty page
/// iterates forever; bounding it is the caller's responsibility.
pub async fn paginate<T, F, Fut, K>(
    mut fetch_page: F,
    page_size: usize,
    options: QueryOptions,
    cursor_key: K,
    mut consumer: PageConsumer<'_, T>,
) -> Result<Vec<T>>
where
    F: FnMut(QueryOptions) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
    K: Fn(&T) -> Option<String>,
{
    let mut collected = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut page_options = options.clone();
        page_options.insert("limit", page_size as u64);
        if let Some(start_key) = cursor.take() {
            page_options.insert("startkey", start_key);
        }

        let page = fetch_page(page_options).await?;
        if page.is_empty() {
            break;
        }

        // The cursor must be taken before the consumer swallows the page.
        let last_key = match page.last().and_then(|item| cursor_key(item)) {
            Some(key) => key,
            None => {
                return Err(DavenportError::InvalidResponse(
                    "last item of page carries no cursor key".to_owned(),
                ))
            }
        };
        cursor = Some(format!("{last_key}{CURSOR_SENTINEL}"));

        match &mut consumer {
            PageConsumer::Collect => collected.extend(page),
            PageConsumer::Callback(on_page) => on_page(page)?,
        }
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::Value;

    use super::*;

    /// Simulates the server side of a keyset listing: sorted keys, inclusive
    /// `startkey`, `limit`-sized pages.
    fn page_for(keys: &[String], options: &QueryOptions) -> Vec<String> {
        let start = options.get("startkey").and_then(Value::as_str).map(str::to_owned);
        let limit =
            options.get("limit").and_then(Value::as_u64).expect("limit always set") as usize;
        keys.iter()
            .filter(|key| start.as_ref().map_or(true, |s| key.as_str() >= s.as_str()))
            .take(limit)
            .cloned()
            .collect()
    }

    fn keys(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("doc-{i:04}")).collect()
    }

    fn identity(key: &String) -> Option<String> {
        Some(key.clone())
    }

    #[tokio::test]
    async fn collects_every_item_in_order() {
        let all = keys(1250);
        let calls = Cell::new(0);
        let fetch = |options: QueryOptions| {
            calls.set(calls.get() + 1);
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let result =
            paginate(fetch, 500, QueryOptions::new(), identity, PageConsumer::Collect)
                .await
                .unwrap();

        assert_eq!(result, all);
        // 500 + 500 + 250 + one empty fetch confirming termination
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn exact_multiple_costs_one_trailing_empty_fetch() {
        let all = keys(1000);
        let calls = Cell::new(0);
        let fetch = |options: QueryOptions| {
            calls.set(calls.get() + 1);
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let result =
            paginate(fetch, 500, QueryOptions::new(), identity, PageConsumer::Collect)
                .await
                .unwrap();

        assert_eq!(result.len(), 1000);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn empty_collection_terminates_after_one_fetch() {
        let calls = Cell::new(0);
        let fetch = |_: QueryOptions| {
            calls.set(calls.get() + 1);
            async move { Ok(Vec::<String>::new()) }
        };

        let result =
            paginate(fetch, 500, QueryOptions::new(), identity, PageConsumer::Collect)
                .await
                .unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn repeating_a_run_yields_identical_results() {
        let all = keys(137);
        let fetch = |options: QueryOptions| {
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let first =
            paginate(fetch, 25, QueryOptions::new(), identity, PageConsumer::Collect)
                .await
                .unwrap();
        let second =
            paginate(fetch, 25, QueryOptions::new(), identity, PageConsumer::Collect)
                .await
                .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn streaming_delivers_the_same_items_in_page_sized_chunks() {
        let all = keys(137);
        let fetch = |options: QueryOptions| {
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let mut streamed = Vec::new();
        let mut chunk_sizes = Vec::new();
        let mut on_page = |page: Vec<String>| -> Result<()> {
            chunk_sizes.push(page.len());
            streamed.extend(page);
            Ok(())
        };
        let collected = paginate(
            fetch,
            25,
            QueryOptions::new(),
            identity,
            PageConsumer::Callback(&mut on_page),
        )
        .await
        .unwrap();

        // Streaming mode returns nothing through the accumulator.
        assert!(collected.is_empty());
        assert_eq!(streamed, all);
        assert_eq!(chunk_sizes, vec![25, 25, 25, 25, 25, 12]);
    }

    #[tokio::test]
    async fn callback_error_stops_before_the_next_fetch() {
        let all = keys(100);
        let calls = Cell::new(0);
        let fetch = |options: QueryOptions| {
            calls.set(calls.get() + 1);
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let mut on_page = |_: Vec<String>| -> Result<()> {
            Err(DavenportError::InvalidResponse("stop".to_owned()))
        };
        let result = paginate(
            fetch,
            10,
            QueryOptions::new(),
            identity,
            PageConsumer::Callback(&mut on_page),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn caller_options_survive_but_limit_and_startkey_are_owned_by_the_engine() {
        let all = keys(30);
        let fetch = |options: QueryOptions| {
            assert_eq!(options.get("descending"), Some(&Value::from(false)));
            assert_eq!(options.get("limit"), Some(&Value::from(10)));
            let page = page_for(&all, &options);
            async move { Ok(page) }
        };

        let caller_options =
            QueryOptions::new().with("descending", false).with("limit", 9999);
        let result =
            paginate(fetch, 10, caller_options, identity, PageConsumer::Collect).await.unwrap();

        assert_eq!(result.len(), 30);
    }

    #[tokio::test]
    async fn missing_cursor_key_is_an_invalid_response() {
        let fetch = |_: QueryOptions| async move { Ok(vec![String::from("only-item")]) };
        let no_key = |_: &String| None;

        let result =
            paginate(fetch, 10, QueryOptions::new(), no_key, PageConsumer::Collect).await;

        assert!(matches!(result, Err(DavenportError::InvalidResponse(_))));
    }
}
