use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser as ClapParser;
use lazy_static::lazy_static;
use serde::Serialize;
use tera::Context;

use flexible_breadcrumbs::acontext::AContext;
use flexible_breadcrumbs::apachelog::Logs;
use flexible_breadcrumbs::breadcrumbs::add_breadcrumb;
use flexible_breadcrumbs::context_processors::ContextProcessors;
use flexible_breadcrumbs::http_request_method::HttpRequestMethodSimple;
use flexible_breadcrumbs::ppath::PPath;
use flexible_breadcrumbs::server::{FnHandler, Router, Site, run_server};
use flexible_breadcrumbs::settings::Settings;
use flexible_breadcrumbs::templates::load_templates;


const PAGE_HTML: &str = include_str!("../../templates/page.html");
const SITE_NAME: &str = "Breadcrumbs Demo";

#[derive(clap::Parser, Debug)]
/// Serve a small demo site showing breadcrumb trails.
struct Args {
    /// JSON settings file; environment variables override its values
    #[clap(long)]
    settings: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000
    #[clap(long)]
    listen: Option<String>,

    /// Directory with Tera templates
    #[clap(long)]
    template_dir: Option<PathBuf>,

    /// Name of the template used to render breadcrumbs
    #[clap(long)]
    breadcrumbs_template: Option<String>,

    /// Directory to write access.log and error.log to (default: stderr)
    #[clap(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct Link {
    label: String,
    url: String,
}

struct Category {
    slug: &'static str,
    name: &'static str,
    items: &'static [(&'static str, &'static str)], // slug, name
}

lazy_static! {
    static ref SHOP: Vec<Category> = vec![
        Category {
            slug: "books",
            name: "Books",
            items: &[("rust-in-action", "Rust in Action"),
                     ("the-book", "The Rust Programming Language")],
        },
        Category {
            slug: "tools",
            name: "Tools",
            items: &[("crab-mug", "Crab Mug")],
        },
    ];
}

fn page(title: &str, paragraphs: &[&str], links: Vec<Link>) -> Context {
    let mut page = Context::new();
    page.insert("title", title);
    page.insert("paragraphs", paragraphs);
    page.insert("links", &links);
    page
}

fn site_name(_request: &AContext) -> Context {
    let mut context = Context::new();
    context.insert("site_name", SITE_NAME);
    context
}

fn home(
    context: &AContext, _method: HttpRequestMethodSimple, pathrest: &PPath, site: &Site
) -> Result<Option<rouille::Response>> {
    if !pathrest.segments().is_empty() {
        return Ok(None)
    }
    add_breadcrumb(context, &site.settings.home_label, None);
    let links = vec![
        Link { label: "Documentation".into(), url: "/docs/getting-started/install".into() },
        Link { label: "Shop".into(), url: "/shop/".into() },
    ];
    site.render(context, "page.html",
                page(SITE_NAME, &["Pick a page to see its trail."], links)).map(Some)
}

/// Trails derived from the URL path, whatever it is.
fn docs(
    context: &AContext, _method: HttpRequestMethodSimple, _pathrest: &PPath, site: &Site
) -> Result<Option<rouille::Response>> {
    context.add_path_breadcrumbs(Some(&site.settings.home_label));
    let title = context.path_segments().last().map(|s| s.as_str()).unwrap_or("docs");
    site.render(context, "page.html",
                page(title, &["This trail was derived from the URL path."], vec![]))
        .map(Some)
}

/// Trails built by the handler, with proper names.
fn shop(
    context: &AContext, _method: HttpRequestMethodSimple, pathrest: &PPath, site: &Site
) -> Result<Option<rouille::Response>> {
    add_breadcrumb(context, &site.settings.home_label, Some("/"));
    let segments = pathrest.segments();
    match segments {
        [] => {
            add_breadcrumb(context, "Shop", None);
            let links = SHOP.iter().map(|c| Link {
                label: c.name.into(),
                url: format!("/shop/{}/", c.slug),
            }).collect();
            site.render(context, "page.html", page("Shop", &[], links)).map(Some)
        }
        [category] => {
            let category = match SHOP.iter().find(|c| c.slug == category.as_str()) {
                Some(c) => c,
                None => return Ok(None),
            };
            add_breadcrumb(context, "Shop", Some("/shop/"));
            add_breadcrumb(context, category.name, None);
            let links = category.items.iter().map(|(slug, name)| Link {
                label: (*name).into(),
                url: format!("/shop/{}/{slug}", category.slug),
            }).collect();
            site.render(context, "page.html", page(category.name, &[], links)).map(Some)
        }
        [category, item] => {
            let category = match SHOP.iter().find(|c| c.slug == category.as_str()) {
                Some(c) => c,
                None => return Ok(None),
            };
            let name = match category.items.iter().find(|(slug, _)| *slug == item.as_str()) {
                Some((_, name)) => *name,
                None => return Ok(None),
            };
            add_breadcrumb(context, "Shop", Some("/shop/"));
            let category_url = format!("/shop/{}/", category.slug);
            add_breadcrumb(context, category.name, Some(&category_url));
            add_breadcrumb(context, name, None);
            site.render(context, "page.html",
                        page(name, &["Not actually for sale."], vec![])).map(Some)
        }
        _ => Ok(None)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.settings.as_deref())?;
    if let Some(listen) = args.listen {
        settings.listen_http = listen;
    }
    if let Some(dir) = args.template_dir {
        settings.template_dir = Some(dir);
    }
    if let Some(name) = args.breadcrumbs_template {
        settings.breadcrumbs_template = name;
    }
    if let Some(dir) = args.log_dir {
        settings.log_dir = Some(dir);
    }

    let tera = load_templates(&settings, &[("page.html", PAGE_HTML)])?;

    let mut processors = ContextProcessors::with_breadcrumbs();
    processors.add(site_name);

    let mut router = Router::new();
    router
        .add("/", Arc::new(FnHandler::new(home)))
        .add("/docs", Arc::new(FnHandler::new(docs)))
        .add("/shop", Arc::new(FnHandler::new(shop)));

    let logs = match &settings.log_dir {
        Some(dir) => Logs::open_in_dir(dir)?,
        None => Logs::stderr(),
    };

    run_server(Arc::new(Site {
        settings,
        tera,
        processors,
        router,
        logs,
    }))
}
