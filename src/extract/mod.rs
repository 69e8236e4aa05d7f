//! Entity extractors.
//!
//! Each submodule turns a fetched [`Document`](crate::fetch::Document) into
//! records from [`crate::models`]. Extractors are pure and synchronous; the
//! facade runs them on the parser's blocking pool.
//!
//! | Page | Module |
//! |------|--------|
//! | `/matches`, `/matches/{id}/..`, `/results` | [`matches`] |
//! | `/events`, `/events/{id}/..`, `/results?event=` | [`events`] |
//! | `/ranking/teams/..`, `/team/{id}/..` | [`teams`] |
//! | `/stats/players`, `/player/{id}/..` | [`players`] |
//! | `/` | [`news`] |
//!
//! A missing optional field degrades to a sentinel (see [`crate::models`]).
//! A missing structural element returns [`ExtractError`], which the facade
//! surfaces as [`crate::HltvError::Parsing`].

use crate::error::ExtractError;
use scraper::{ElementRef, Selector};

pub mod events;
pub mod matches;
pub mod news;
pub mod players;
pub mod teams;

/// A lazily compiled, process-wide selector for a CSS literal.
macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: once_cell::sync::Lazy<scraper::Selector> = once_cell::sync::Lazy::new(|| {
            scraper::Selector::parse($css).expect(concat!("valid selector: ", $css))
        });
        &*SELECTOR
    }};
}
pub(crate) use selector;

pub(crate) type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Concatenated text of `el`, trimmed.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Concatenated text of `el`, untouched.
pub(crate) fn raw_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

pub(crate) fn first<'a>(scope: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    scope.select(sel).next()
}

pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    first(scope, sel).map(text)
}

/// First match of `sel`, or [`ExtractError::MissingElement`] naming `what`.
pub(crate) fn require<'a>(
    scope: ElementRef<'a>,
    sel: &Selector,
    what: &'static str,
) -> ExtractResult<ElementRef<'a>> {
    first(scope, sel).ok_or(ExtractError::MissingElement(what))
}

pub(crate) fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

pub(crate) fn require_attr<'a>(
    el: ElementRef<'a>,
    element: &'static str,
    name: &'static str,
) -> ExtractResult<&'a str> {
    attr(el, name).ok_or(ExtractError::MissingAttribute {
        element,
        attr: name,
    })
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Numeric attribute, defaulting to `0` when missing or malformed.
pub(crate) fn attr_u64(el: ElementRef<'_>, name: &str) -> u64 {
    attr(el, name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Split a `2 - 1` score cell into its two sides.
pub(crate) fn split_score(raw: &str) -> (String, String) {
    match raw.split_once('-') {
        Some((a, b)) => (a.trim().to_string(), b.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

/// First all-digit path segment of an href.
pub(crate) fn first_numeric_segment(href: &str) -> Option<u64> {
    href.split('/')
        .find(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
}
