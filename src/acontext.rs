use std::{net::{SocketAddr, IpAddr}, time::SystemTime};

use anyhow::{Result, anyhow};
use kstring::KString;
use rouille::{Request, HeadersIter};

use crate::apachelog::request_line;
use crate::breadcrumbs::{BreadcrumbSlot, HasBreadcrumbs, breadcrumbs_from_path,
                         extend_breadcrumbs};
use crate::http_request_method::HttpRequestMethod;
use crate::ppath::PPath;


/// Everything a handler gets to know about the request it is
/// answering, plus the per-request state handlers accumulate (the
/// breadcrumb trail).
pub struct AContext<'r> {
    // Fallback for host(): what this server listens on; ip:port or
    // domain:port or whatever is deemed suitable
    listen_addr: &'r str,
    path: PPath,
    // The path as sent, before percent-decoding
    raw_path: PPath,
    path_string: String,
    now: SystemTime,
    method: HttpRequestMethod,
    request: &'r Request,
    breadcrumbs: BreadcrumbSlot,
}

impl<'r> AContext<'r> {
    /// Fails for request methods we don't know about.
    pub fn new(request: &'r Request, listen_addr: &'r str) -> Result<Self> {
        let path_original = request.url(); // path only
        let path = PPath::from_str(&path_original);
        let path_string = path.to_string();
        let raw_url = request.raw_url();
        let raw_path = PPath::from_str(
            raw_url.split_once('?').map_or(raw_url, |(path, _)| path));
        let method = HttpRequestMethod::from_str(request.method())?;
        Ok(AContext {
            listen_addr,
            path,
            raw_path,
            path_string,
            now: SystemTime::now(),
            method,
            request,
            breadcrumbs: BreadcrumbSlot::new(),
        })
    }

    /// Like the request part in Apache style Combined Log Format
    pub fn request_line(&self) -> String {
        request_line(self.request)
    }
    /// `foo` part in `?foo`
    pub fn query_string(&self) -> &str {
        self.request.raw_query_string()
    }
    pub fn user_agent(&self) -> Option<&str> {
        self.request.header("user-agent")
    }
    pub fn client_ip(&self) -> IpAddr {
        self.request.remote_addr().ip()
    }
    pub fn client_addr(&self) -> &SocketAddr { self.request.remote_addr() }
    pub fn method_str(&self) -> &str { self.request.method() }
    pub fn method(&self) -> HttpRequestMethod { self.method }
    /// Only checks query parameters.
    pub fn get_param(&self, name: &str) -> Option<String>  {
        self.request.get_param(name)
    }
    pub fn param(&self, name: &str) -> Result<String>  {
        self.get_param(name).ok_or_else(
            || anyhow!("missing param {name:?}"))
    }
    pub fn host(&self) -> Option<&str> { self.request.header("host") }
    pub fn host_or_listen_addr(&self) -> &str {
        self.request.header("host").unwrap_or(self.listen_addr)
    }
    /// The percent-decoded path, used for routing.
    pub fn path(&self) -> &PPath { &self.path }
    pub fn raw_path(&self) -> &PPath { &self.raw_path }
    pub fn path_str(&self) -> &str { &self.path_string }
    pub fn now(&self) -> &SystemTime { &self.now }
    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }

    pub fn header(&self, key: &str) -> Option<&str> { self.request.header(key) }
    pub fn headers(&self) -> HeadersIter { self.request.headers() }

    pub fn request(&self) -> &Request { self.request }

    /// Append the trail derived from the request path (see
    /// `breadcrumbs_from_path`).
    pub fn add_path_breadcrumbs(&self, home_label: Option<&str>) {
        extend_breadcrumbs(self, breadcrumbs_from_path(&self.raw_path, home_label));
    }

    /// The path segments, for handlers that build labels from them.
    pub fn path_segments(&self) -> &[KString] {
        self.path.segments()
    }
}

impl<'r> HasBreadcrumbs for AContext<'r> {
    fn breadcrumb_slot(&self) -> &BreadcrumbSlot {
        &self.breadcrumbs
    }
}
