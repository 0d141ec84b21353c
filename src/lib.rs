//! Breadcrumb trails for rouille web applications.
//!
//! Handlers append `{label, url}` entries to the request they are
//! answering (`breadcrumbs::add_breadcrumb`), the `breadcrumbs`
//! context processor hands the trail to the page template, and the
//! `render_breadcrumbs` template function renders it through the
//! configured breadcrumbs template.

pub mod warn;
pub mod settings;
pub mod ppath;
pub mod url_encoding;
pub mod http_request_method;
pub mod http_response_status_codes;
pub mod breadcrumbs;
pub mod acontext;
pub mod context_processors;
pub mod templatetags;
pub mod templates;
pub mod webutils;
pub mod apachelog;
pub mod server;
