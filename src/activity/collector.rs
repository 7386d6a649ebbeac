//! Cursor-paginated event collection
//!
//! Pages are produced lazily, one fetch at a time, and the stream ends when
//! the upstream stops returning a cursor, returns an empty page, or hands back
//! a cursor it already gave us.

use std::collections::HashSet;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, warn};

use crate::activity::models::Event;
use crate::upstream::{NotificationSource, Page, UpstreamError, UpstreamResult};

#[derive(Default)]
struct CursorState {
    cursor: Option<String>,
    seen: HashSet<String>,
    exhausted: bool,
}

impl CursorState {
    /// Decide whether another page should be fetched after `page`.
    fn advance(&mut self, page: &Page) {
        let next = match page.cursor() {
            Some(next) if !page.events.is_empty() => next,
            _ => {
                self.exhausted = true;
                return;
            }
        };

        if self.seen.insert(next.to_string()) {
            self.cursor = Some(next.to_string());
        } else {
            warn!(cursor = next, "upstream repeated a pagination cursor, stopping");
            self.exhausted = true;
        }
    }
}

/// Stream of pages from `source`, starting without a cursor.
pub fn pages<'a, S>(source: &'a S) -> impl Stream<Item = UpstreamResult<Page>> + Send + 'a
where
    S: NotificationSource + ?Sized,
{
    stream::try_unfold(CursorState::default(), move |mut state| async move {
        if state.exhausted {
            return Ok(None);
        }

        let page = source.fetch_page(state.cursor.as_deref()).await?;
        state.advance(&page);
        Ok::<_, UpstreamError>(Some((page, state)))
    })
}

/// Fetch every page and concatenate the events in the order returned.
pub async fn collect_events<S>(source: &S) -> UpstreamResult<Vec<Event>>
where
    S: NotificationSource + ?Sized,
{
    let events = pages(source)
        .try_fold(Vec::new(), |mut events, page| async move {
            events.extend(page.events);
            Ok(events)
        })
        .await?;

    debug!(events = events.len(), "collected notification events");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::Profile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves scripted pages in order and records the cursors it was asked for
    struct ScriptedSource {
        pages: Vec<Page>,
        calls: AtomicUsize,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Page>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationSource for ScriptedSource {
        async fn fetch_page(&self, cursor: Option<&str>) -> UpstreamResult<Page> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            self.cursors.lock().unwrap().push(cursor.map(str::to_string));
            // Repeat the last scripted page forever once the script runs out.
            let page = self.pages.get(index).or(self.pages.last()).cloned();
            Ok(page.unwrap_or_default())
        }

        async fn get_profile(&self, _actor: &str) -> UpstreamResult<Profile> {
            Ok(Profile::default())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl NotificationSource for FailingSource {
        async fn fetch_page(&self, _cursor: Option<&str>) -> UpstreamResult<Page> {
            Err(UpstreamError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn get_profile(&self, _actor: &str) -> UpstreamResult<Profile> {
            Ok(Profile::default())
        }
    }

    fn page(ids: &[&str], cursor: Option<&str>) -> Page {
        Page {
            events: ids.iter().map(|id| Event::new(*id, "like", None)).collect(),
            next_cursor: cursor.map(str::to_string),
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn follows_cursor_chain_until_it_ends() {
        let source = ScriptedSource::new(vec![
            page(&["a", "b"], Some("c1")),
            page(&["c"], Some("c2")),
            page(&["d"], None),
        ]);

        let events = collect_events(&source).await.unwrap();

        assert_eq!(ids(&events), vec!["a", "b", "c", "d"]);
        assert_eq!(
            *source.cursors.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn stops_on_empty_page_even_with_cursor() {
        let source = ScriptedSource::new(vec![
            page(&["a"], Some("c1")),
            page(&[], Some("c2")),
            page(&["never"], None),
        ]);

        let events = collect_events(&source).await.unwrap();

        assert_eq!(ids(&events), vec!["a"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn stops_after_first_repeated_cursor() {
        // The last page is repeated forever with the same cursor.
        let source = ScriptedSource::new(vec![page(&["x"], Some("stuck"))]);

        let events = collect_events(&source).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn empty_cursor_ends_collection() {
        let source = ScriptedSource::new(vec![page(&["a"], Some("")), page(&["b"], None)]);

        let events = collect_events(&source).await.unwrap();

        assert_eq!(ids(&events), vec!["a"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let result = collect_events(&FailingSource).await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 503, .. })));
    }
}
