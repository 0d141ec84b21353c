//! Per-request breadcrumb storage.

//! A request starts out without a breadcrumb list; the first
//! `add_breadcrumb` creates it. Reading never creates it, an absent
//! list reads as empty.

use std::cell::RefCell;

use kstring::KString;
use serde::Serialize;

use crate::ppath::PPath;
use crate::url_encoding::url_decode;

/// One navigation entry. Templates see it as `{label, url}`, with
/// `url` being `null` for an entry that isn't a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: KString,
    pub url: Option<KString>,
}

impl Breadcrumb {
    pub fn new(label: &str, url: Option<&str>) -> Self {
        Breadcrumb {
            label: KString::from_ref(label),
            url: url.map(KString::from_ref),
        }
    }
}

/// The slot a request carries its breadcrumbs in. Handlers only get
/// shared references to their request context, hence the interior
/// mutability. Not `Sync`: a request is handled by a single thread.
#[derive(Debug, Default)]
pub struct BreadcrumbSlot(RefCell<Option<Vec<Breadcrumb>>>);

impl BreadcrumbSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Anything carrying a `BreadcrumbSlot`, usually the request context.
pub trait HasBreadcrumbs {
    fn breadcrumb_slot(&self) -> &BreadcrumbSlot;
}

impl HasBreadcrumbs for BreadcrumbSlot {
    fn breadcrumb_slot(&self) -> &BreadcrumbSlot {
        self
    }
}

/// Append a breadcrumb, creating the request's list first if needed.
pub fn add_breadcrumb<R: HasBreadcrumbs + ?Sized>(request: &R, label: &str, url: Option<&str>) {
    push_breadcrumb(request, Breadcrumb::new(label, url))
}

pub fn push_breadcrumb<R: HasBreadcrumbs + ?Sized>(request: &R, breadcrumb: Breadcrumb) {
    request.breadcrumb_slot().0.borrow_mut()
        .get_or_insert_with(Vec::new)
        .push(breadcrumb);
}

/// Append several breadcrumbs in iteration order.
pub fn extend_breadcrumbs<R, I>(request: &R, breadcrumbs: I)
where R: HasBreadcrumbs + ?Sized,
      I: IntoIterator<Item = Breadcrumb>
{
    request.breadcrumb_slot().0.borrow_mut()
        .get_or_insert_with(Vec::new)
        .extend(breadcrumbs);
}

/// The request's breadcrumbs in insertion order; empty if none were
/// ever added.
pub fn get_breadcrumbs<R: HasBreadcrumbs + ?Sized>(request: &R) -> Vec<Breadcrumb> {
    request.breadcrumb_slot().0.borrow()
        .as_ref()
        .cloned()
        .unwrap_or_default()
}

/// Whether `add_breadcrumb` (or `extend_breadcrumbs`) was called on
/// this request.
pub fn has_breadcrumbs<R: HasBreadcrumbs + ?Sized>(request: &R) -> bool {
    request.breadcrumb_slot().0.borrow().is_some()
}

/// Back to the state of a fresh request.
pub fn clear_breadcrumbs<R: HasBreadcrumbs + ?Sized>(request: &R) {
    *request.breadcrumb_slot().0.borrow_mut() = None;
}

/// Derive a trail from a URL path as sent by the client (still
/// percent-encoded): the home entry (if given) linking to the root,
/// then one entry per segment. Ancestors link to their directory
/// path, the last segment is the current page and is not linked. For
/// the root path itself, the home entry is the current page. Urls
/// keep the encoding of `raw_path`, labels are decoded (segments that
/// don't decode are shown as they are).
pub fn breadcrumbs_from_path(raw_path: &PPath, home_label: Option<&str>) -> Vec<Breadcrumb> {
    let segments = raw_path.segments();
    let mut out = Vec::with_capacity(segments.len() + 1);
    if let Some(home_label) = home_label {
        let url = if segments.is_empty() {
            None
        } else {
            Some(raw_path.prefix(0).to_string())
        };
        out.push(Breadcrumb::new(home_label, url.as_deref()));
    }
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        let url = if is_last {
            None
        } else {
            Some(raw_path.prefix(i + 1).to_string())
        };
        let label = url_decode(segment).unwrap_or_else(|_| segment.to_string());
        out.push(Breadcrumb::new(&label, url.as_deref()));
    }
    out
}
