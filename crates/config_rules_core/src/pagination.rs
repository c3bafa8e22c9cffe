//! Token-driven pagination with a fixed pause between dependent calls.

use std::marker::PhantomData;
use std::time::Duration;

use crate::contract::{Page, THROTTLE_PERIOD_MS};

/// Pause inserted between two calls to the same endpoint.
pub trait Throttle {
    fn pause(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    period: Duration,
}

impl FixedDelay {
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(THROTTLE_PERIOD_MS))
    }
}

impl Throttle for FixedDelay {
    fn pause(&self) {
        std::thread::sleep(self.period);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Continue(String),
    Done,
}

/// Lazy sequence of pages. Each `next` issues at most one request; the
/// throttle runs before every request except the first. After an error or the
/// last page the iterator is exhausted. Build a new one to start over.
pub struct Pages<'t, T, F> {
    fetch: F,
    throttle: &'t dyn Throttle,
    cursor: Cursor,
    _items: PhantomData<fn() -> T>,
}

impl<'t, T, F> Pages<'t, T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, String>,
{
    pub fn new(throttle: &'t dyn Throttle, fetch: F) -> Self {
        Self {
            fetch,
            throttle,
            cursor: Cursor::Start,
            _items: PhantomData,
        }
    }

    pub fn is_done(&self) -> bool {
        self.cursor == Cursor::Done
    }
}

impl<T, F> Iterator for Pages<'_, T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, String>,
{
    type Item = Result<Vec<T>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::Continue(token) => {
                self.throttle.pause();
                Some(token)
            }
        };

        let page = match (self.fetch)(token.as_deref()) {
            Ok(page) => page,
            Err(error) => return Some(Err(error)),
        };

        // An empty token is how some services spell "no more pages".
        if let Some(next) = page.next_token.filter(|next| !next.is_empty()) {
            self.cursor = Cursor::Continue(next);
        }
        Some(Ok(page.items))
    }
}

/// Drains every page in order. The first failing page aborts the whole fetch.
pub fn fetch_all<T, F>(throttle: &dyn Throttle, fetch: F) -> Result<Vec<T>, String>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, String>,
{
    let mut items = Vec::new();
    for page in Pages::new(throttle, fetch) {
        items.extend(page?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CountingThrottle;

    fn scripted(
        pages: usize,
        per_page: usize,
    ) -> impl FnMut(Option<&str>) -> Result<Page<usize>, String> {
        let mut seen_tokens: Vec<Option<String>> = Vec::new();
        move |token: Option<&str>| {
            let index = seen_tokens.len();
            let expected = (index > 0).then(|| format!("page-{index}"));
            assert_eq!(token.map(str::to_string), expected, "token out of order");
            seen_tokens.push(token.map(str::to_string));

            let items = (0..per_page).map(|offset| index * per_page + offset).collect();
            if index + 1 < pages {
                Ok(Page::with_next(items, format!("page-{}", index + 1)))
            } else {
                Ok(Page::last(items))
            }
        }
    }

    #[test]
    fn accumulates_every_page_in_order() {
        let throttle = CountingThrottle::default();
        let items = fetch_all(&throttle, scripted(4, 3)).expect("fetch should succeed");

        assert_eq!(items, (0..12).collect::<Vec<_>>());
        assert_eq!(throttle.pauses(), 3);
    }

    #[test]
    fn single_page_never_pauses() {
        let throttle = CountingThrottle::default();
        let items = fetch_all(&throttle, scripted(1, 2)).expect("fetch should succeed");

        assert_eq!(items, vec![0, 1]);
        assert_eq!(throttle.pauses(), 0);
    }

    #[test]
    fn error_on_later_page_discards_partial_results() {
        let throttle = CountingThrottle::default();
        let mut calls = 0;
        let result: Result<Vec<u8>, String> = fetch_all(&throttle, |_| {
            calls += 1;
            if calls == 1 {
                Ok(Page::with_next(vec![1, 2], "next"))
            } else {
                Err("throttling exception".to_string())
            }
        });

        assert_eq!(result, Err("throttling exception".to_string()));
        assert_eq!(calls, 2);
    }

    #[test]
    fn empty_token_ends_pagination() {
        let throttle = CountingThrottle::default();
        let mut calls = 0;
        let items = fetch_all(&throttle, |_| {
            calls += 1;
            Ok(Page::with_next(vec!["a"], ""))
        })
        .expect("fetch should succeed");

        assert_eq!(items, vec!["a"]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn pages_are_fetched_lazily() {
        let throttle = CountingThrottle::default();
        let mut calls = 0;
        let mut pages = Pages::new(&throttle, |_| {
            calls += 1;
            Ok(Page::with_next(vec![calls], "more"))
        });

        assert_eq!(pages.next(), Some(Ok(vec![1])));
        assert_eq!(pages.next(), Some(Ok(vec![2])));
        assert!(!pages.is_done());
        drop(pages);
        assert_eq!(calls, 2);
        assert_eq!(throttle.pauses(), 1);
    }

    #[test]
    fn iterator_is_exhausted_after_an_error() {
        let throttle = CountingThrottle::default();
        let mut pages = Pages::new(&throttle, |_| -> Result<Page<u8>, String> {
            Err("denied".to_string())
        });

        assert_eq!(pages.next(), Some(Err("denied".to_string())));
        assert!(pages.is_done());
        assert_eq!(pages.next(), None);
    }

    #[test]
    fn default_delay_uses_configured_period() {
        assert_eq!(
            FixedDelay::default().period(),
            Duration::from_millis(THROTTLE_PERIOD_MS)
        );
    }
}
