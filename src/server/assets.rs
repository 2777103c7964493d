//! Static asset constants (HTML, CSS and JavaScript).

/// Landing page with the search form.
pub const INDEX_HTML: &str = include_str!("index.html");

/// Stylesheet for the landing page.
pub const CSS: &str = include_str!("styles.css");

/// Search form behaviour and result rendering.
pub const JS: &str = include_str!("app.js");
