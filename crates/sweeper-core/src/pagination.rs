//! Cursor-driven page accumulation
//!
//! Remote listing APIs hand back one page plus an opaque continuation token.
//! [`collect_pages`] follows the token until the API stops returning one and
//! concatenates every page in server order.

use anyhow::Result;
use std::future::Future;
use tracing::trace;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<&str>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    /// A page with no continuation token
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// Fetch every page and return the concatenated items.
///
/// `fetch` receives `None` for the first page and the previous page's cursor
/// afterwards. Iteration stops on an absent or empty cursor. The first fetch
/// error is returned as-is and any items gathered so far are dropped.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    trace!(pages, items = items.len(), "Collected paginated listing");
    Ok(items)
}
