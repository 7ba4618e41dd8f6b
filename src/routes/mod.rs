use gazette_models::config::CONFIG;
use rocket::{
    response::{content::RawHtml, Redirect},
    Responder,
};
use serde::Serialize;

pub mod comments;
pub mod errors;
pub mod groups;
pub mod posts;
pub mod session;
pub mod user;

/// A 1-based page number taken from the `page` query parameter.
///
/// Anything that doesn't parse as a number becomes the first page, and
/// numbers past the end clamp to the last page.
#[derive(Clone, Copy, Serialize)]
pub struct Page(i32);

impl Page {
    pub fn first() -> Page {
        Page(1)
    }

    pub fn from_param(param: Option<i32>) -> Page {
        Page(param.unwrap_or(1).max(1))
    }

    /// Computes the total number of pages needed to display n_items.
    pub fn total(n_items: i64) -> i32 {
        let per_page = i64::from(CONFIG.items_per_page);
        let pages = (n_items + per_page - 1) / per_page;
        pages.max(1) as i32
    }

    pub fn clamped(self, n_items: i64) -> Page {
        Page(self.0.min(Page::total(n_items)))
    }

    pub fn limits(self) -> (i32, i32) {
        (
            (self.0 - 1) * CONFIG.items_per_page,
            self.0 * CONFIG.items_per_page,
        )
    }

    pub fn number(self) -> i32 {
        self.0
    }
}

/// Pagination state handed to the templates.
#[derive(Serialize)]
pub struct Pagination {
    pub page: i32,
    pub pages: i32,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev: i32,
    pub next: i32,
}

impl Pagination {
    pub fn build(page: Page, n_items: i64) -> Pagination {
        let pages = Page::total(n_items);
        let page = page.number();
        Pagination {
            page,
            pages,
            has_prev: page > 1,
            has_next: page < pages,
            prev: page - 1,
            next: page + 1,
        }
    }
}

/// Either a redirect (the operation went through) or a re-rendered form
/// (validation failed).
#[derive(Responder)]
pub enum FormResponse {
    Redirect(Redirect),
    Page(RawHtml<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals() {
        assert_eq!(Page::total(0), 1);
        assert_eq!(Page::total(10), 1);
        assert_eq!(Page::total(13), 2);
        assert_eq!(Page::total(20), 2);
        assert_eq!(Page::total(21), 3);
    }

    #[test]
    fn limits_are_page_windows() {
        assert_eq!(Page::first().limits(), (0, 10));
        assert_eq!(Page::from_param(Some(2)).limits(), (10, 20));
    }

    #[test]
    fn clamping() {
        assert_eq!(Page::from_param(None).number(), 1);
        assert_eq!(Page::from_param(Some(-3)).number(), 1);
        assert_eq!(Page::from_param(Some(999)).clamped(13).number(), 2);
        assert_eq!(Page::from_param(Some(2)).clamped(13).number(), 2);
        assert_eq!(Page::from_param(Some(1)).clamped(0).number(), 1);
    }
}
