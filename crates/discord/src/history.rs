//! Paging over Discord message history.

use std::future::Future;

use {
    prunebot_channels::PlatformError,
    serenity::{all::MessageId, http::MessagePagination},
    tokio_stream::Stream,
};

/// Discord's maximum page size for message history.
pub(crate) const PAGE_SIZE: u8 = 100;

/// Order a page fetched with an `after` cursor oldest-first and drop
/// everything at or past `bound`. Returns whether the walk is finished.
pub(crate) fn forward_page<T>(
    mut page: Vec<T>,
    id: impl Fn(&T) -> u64,
    bound: u64,
    page_size: usize,
) -> (Vec<T>, bool) {
    let full = page.len() >= page_size;
    page.sort_by_key(|m| id(m));
    let before = page.iter().take_while(|m| id(m) < bound).count();
    let reached_bound = before < page.len();
    page.truncate(before);
    (page, reached_bound || !full)
}

/// Stream every item with a snowflake below `bound`, fetching pages lazily
/// through `fetch(cursor, limit)`.
///
/// Oldest-first walks page forward with `After` cursors from the start of
/// the channel. Otherwise pages go backward from `Before(bound)`, newest
/// first. At most `limit` items are yielded. A fetch error is yielded once
/// and ends the stream.
pub(crate) fn paginate<'a, T, F, Fut>(
    fetch: F,
    id: impl Fn(&T) -> u64 + Send + 'a,
    bound: u64,
    limit: Option<usize>,
    oldest_first: bool,
) -> impl Stream<Item = Result<T, PlatformError>> + Send + 'a
where
    T: Send + 'a,
    F: Fn(MessagePagination, u8) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Vec<T>, PlatformError>> + Send + 'a,
{
    async_stream::stream! {
        // Snowflakes start at 1; nothing can sort below it.
        if bound <= 1 {
            return;
        }
        let mut remaining = limit.unwrap_or(usize::MAX);

        if oldest_first {
            let mut cursor = MessageId::new(1);
            while remaining > 0 {
                let page_limit = remaining.min(PAGE_SIZE as usize) as u8;
                let page = match fetch(MessagePagination::After(cursor), page_limit).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                let (page, done) = forward_page(page, &id, bound, page_limit as usize);
                for item in page.into_iter().take(page_limit as usize) {
                    cursor = MessageId::new(id(&item));
                    remaining -= 1;
                    yield Ok(item);
                }
                if done {
                    return;
                }
            }
        } else {
            let mut cursor = MessageId::new(bound);
            while remaining > 0 {
                let page_limit = remaining.min(PAGE_SIZE as usize) as u8;
                let mut page = match fetch(MessagePagination::Before(cursor), page_limit).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                let full = page.len() >= page_limit as usize;
                page.sort_by_key(|m| std::cmp::Reverse(id(m)));
                for item in page.into_iter().take(page_limit as usize) {
                    cursor = MessageId::new(id(&item));
                    remaining -= 1;
                    yield Ok(item);
                }
                if !full {
                    return;
                }
            }
        }
    }
}
