//! Routing requests to page handlers, and running the rouille server.

use std::any::type_name;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Result, anyhow};
use rouille::{Request, Response, Server};
use tera::{Context, Tera};

use crate::acontext::AContext;
use crate::apachelog::{Logs, log_combined, log_response};
use crate::context_processors::ContextProcessors;
use crate::http_request_method::{HttpRequestMethodGrouped, HttpRequestMethodSimple};
use crate::http_response_status_codes::HttpResponseStatusCode;
use crate::ppath::PPath;
use crate::settings::Settings;
use crate::warn;
use crate::webutils::{errorpage_from_status, render_response};


pub trait Handler: Debug + Send + Sync {
    /// Returning Ok(None) means, the handler is refusing to handle
    /// the request; it is answered with 404 not found. Err means,
    /// the handler has accepted to handle the request but failed to;
    /// this is answered with an internal server error.
    fn call(
        &self,
        context: &AContext,
        method: HttpRequestMethodSimple,
        pathrest: &PPath,
        site: &Site,
    ) -> Result<Option<Response>>;
}

/// A Handler that allows a path surplus, passing it to the handler
/// Fn. The handler may still refuse to handle the request (404).
pub struct FnHandler<F> {
    handler: F,
}

impl<F> FnHandler<F>
where F: Fn(&AContext, HttpRequestMethodSimple, &PPath, &Site) -> Result<Option<Response>>
         + Send + Sync
{
    pub fn new(handler: F) -> Self {
        FnHandler { handler }
    }
}

impl<F> Handler for FnHandler<F>
where F: Fn(&AContext, HttpRequestMethodSimple, &PPath, &Site) -> Result<Option<Response>>
         + Send + Sync
{
    fn call(
        &self,
        context: &AContext,
        method: HttpRequestMethodSimple,
        pathrest: &PPath,
        site: &Site,
    ) -> Result<Option<Response>> {
        (self.handler)(context, method, pathrest, site)
    }
}

impl<F> Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("FnHandler({})", type_name::<F>()))
    }
}


/// Maps path prefixes to handlers; the longest matching prefix wins.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<(PPath, Arc<dyn Handler>)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// `prefix` must be an absolute path.
    pub fn add(&mut self, prefix: &str, handler: Arc<dyn Handler>) -> &mut Self {
        let prefix = PPath::from_str(prefix);
        assert!(prefix.is_absolute(), "route prefix must be absolute: {prefix}");
        self.routes.push((prefix, handler));
        self
    }

    /// The handler for `path`, and the part of `path` after the
    /// handler's prefix.
    pub fn lookup(&self, path: &PPath) -> Option<(&Arc<dyn Handler>, PPath)> {
        self.routes.iter()
            .filter_map(|(prefix, handler)| {
                path.strip_prefix(prefix).map(|rest| (prefix.segments().len(), handler, rest))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, handler, rest)| (handler, rest))
    }
}


/// What a running site consists of.
pub struct Site {
    pub settings: Settings,
    pub tera: Tera,
    pub processors: ContextProcessors,
    pub router: Router,
    pub logs: Arc<Mutex<Logs>>,
}

impl Site {
    /// Render `template` with the variables from the context
    /// processors, plus `page` (which wins on conflicts).
    pub fn render(&self, context: &AContext, template: &str, page: Context) -> Result<Response> {
        let mut variables = self.processors.context(context);
        variables.extend(page);
        render_response(&self.tera, template, &variables)
    }

    pub fn handle_request(
        &self,
        context: &AContext,
        method: HttpRequestMethodSimple,
    ) -> Result<Response> {
        if let Some((handler, pathrest)) = self.router.lookup(context.path()) {
            if let Some(response) = handler.call(context, method, &pathrest, self)? {
                return Ok(response)
            }
        }
        Ok(errorpage_from_status(HttpResponseStatusCode::NotFound404))
    }
}


/// Make a handler for Rouille's `Server`. Every response gets an
/// access log line, including those for unknown request methods.
pub fn server_handler(
    listen_addr: String,
    site: Arc<Site>,
) -> impl Fn(&Request) -> Response + Send + Sync + 'static
{
    move |request: &Request| -> Response {
        let start_instant = Instant::now();
        match AContext::new(request, &listen_addr) {
            Ok(context) => log_combined(&context, &site.logs, || {
                match context.method().to_grouped() {
                    HttpRequestMethodGrouped::Simple(method) =>
                        site.handle_request(&context, method),
                    HttpRequestMethodGrouped::Other(method) => {
                        warn!("method {:?} not implemented", method.as_str());
                        Ok(errorpage_from_status(HttpResponseStatusCode::NotImplemented501))
                    }
                }
            }),
            Err(e) => {
                // No context without a known method; log what we have
                warn!("{e:#}");
                log_response(&site.logs, request, start_instant.elapsed(),
                             errorpage_from_status(HttpResponseStatusCode::NotImplemented501))
            }
        }
    }
}

/// Serve `site` on `settings.listen_http`; only returns on failure
/// to start.
pub fn run_server(site: Arc<Site>) -> Result<()> {
    let addr = site.settings.listen_http.clone();
    let server = Server::new(addr.clone(), server_handler(addr.clone(), site))
        .map_err(|e| anyhow!("error starting server on {addr:?}: {e}"))?;
    warn!("listening on {addr}");
    server.run();
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::io::{sink, Read};

    use super::*;
    use crate::breadcrumbs::add_breadcrumb;
    use crate::templates::load_templates;

    const PAGE: &str = "<h1>{{ title }}</h1>{{ render_breadcrumbs(breadcrumbs=breadcrumbs) }}";
    const CRUMBS: &str = "{% for c in breadcrumbs %}[{{ c.label }}]{% endfor %}";

    /// Collects what a boxed log output gets written.
    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    fn site() -> Arc<Site> {
        site_with_logs(Logs {
            access_log: Box::new(sink()),
            error_log: Box::new(sink()),
        })
    }

    fn site_with_logs(logs: Logs) -> Arc<Site> {
        let settings = Settings {
            breadcrumbs_template: "crumbs.html".into(),
            ..Settings::default()
        };
        let tera = load_templates(&settings, &[("page.html", PAGE), ("crumbs.html", CRUMBS)])
            .unwrap();
        let mut router = Router::new();
        router
            .add("/", Arc::new(FnHandler::new(
                |context: &AContext, _method, pathrest: &PPath, site: &Site| {
                    if !pathrest.segments().is_empty() {
                        return Ok(None)
                    }
                    add_breadcrumb(context, "Home", None);
                    let mut page = Context::new();
                    page.insert("title", "Welcome");
                    site.render(context, "page.html", page).map(Some)
                })))
            .add("/docs", Arc::new(FnHandler::new(
                |context: &AContext, _method, _pathrest: &PPath, site: &Site| {
                    context.add_path_breadcrumbs(Some(&site.settings.home_label));
                    let mut page = Context::new();
                    page.insert("title", "Docs");
                    site.render(context, "page.html", page).map(Some)
                })))
            .add("/broken", Arc::new(FnHandler::new(
                |_context: &AContext, _method, _pathrest: &PPath, site: &Site| {
                    site.tera.render("nonexistent.html", &Context::new())?;
                    Ok(None)
                })));
        Arc::new(Site {
            settings,
            tera,
            processors: ContextProcessors::with_breadcrumbs(),
            router,
            logs: Arc::new(Mutex::new(logs)),
        })
    }

    fn get(method: &str, url: &str) -> (u16, String) {
        let handler = server_handler("127.0.0.1:3000".into(), site());
        let response = handler(&Request::fake_http(method, url, vec![], vec![]));
        let (mut data, _) = response.data.into_reader_and_size();
        let mut body = String::new();
        data.read_to_string(&mut body).unwrap();
        (response.status_code, body)
    }

    #[test]
    fn t_lookup() {
        let site = site();
        let (_, rest) = site.router.lookup(&PPath::from_str("/docs/intro")).unwrap();
        assert_eq!(rest.to_string(), "intro");
        let (_, rest) = site.router.lookup(&PPath::from_str("/other")).unwrap();
        assert_eq!(rest.to_string(), "other");
        assert!(Router::new().lookup(&PPath::from_str("/")).is_none());
    }

    #[test]
    fn t_pages() {
        assert_eq!(get("GET", "/"), (200, "<h1>Welcome</h1>[Home]".into()));
        assert_eq!(get("GET", "/docs/guide/intro"),
                   (200, "<h1>Docs</h1>[Home][docs][guide][intro]".into()));
    }

    #[test]
    fn t_not_found_and_errors() {
        assert_eq!(get("GET", "/nothing/here").0, 404);
        assert_eq!(get("GET", "/broken").0, 500);
        assert_eq!(get("DELETE", "/").0, 501);
        assert_eq!(get("BREW", "/").0, 501);
    }

    #[test]
    fn t_unknown_method_is_access_logged() {
        let access = LogBuf::default();
        let handler = server_handler("127.0.0.1:3000".into(), site_with_logs(Logs {
            access_log: Box::new(access.clone()),
            error_log: Box::new(sink()),
        }));
        let response = handler(&Request::fake_http("BREW", "/pot", vec![], vec![]));
        assert_eq!(response.status_code, 501);
        let line = String::from_utf8(access.0.lock().unwrap().clone()).unwrap();
        assert!(line.contains("] \"BREW /pot\" 501 "), "{line}");
        assert_eq!(line.lines().count(), 1);
    }
}
