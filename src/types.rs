//! Core types shared across the resource runtime.

/// Separator between the document part and the fragment part of an href.
pub const FRAGMENT_SEPARATOR: char = '#';

/// Split an href on the first `#` into `(uri_part, fragment_part)`.
///
/// The fragment part is empty when the href carries no `#`.
pub fn split_href(href: &str) -> (&str, &str) {
    match href.split_once(FRAGMENT_SEPARATOR) {
        Some((uri, fragment)) => (uri, fragment),
        None => (href, ""),
    }
}
