//! Setting up the Tera template set for a site.

use std::path::Path;

use tera::Tera;

use crate::settings::{Settings, DEFAULT_BREADCRUMBS_TEMPLATE};
use crate::templatetags;

/// The `breadcrumbs.html` shipped with this crate: a `<nav>` with an
/// ordered list; entries with an url are links.
pub const BUILTIN_BREADCRUMBS_HTML: &str = include_str!("../templates/breadcrumbs.html");

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("template {0:?} not found")]
    MissingTemplate(String),
    #[error("template directory {0:?} is not valid unicode")]
    NonUnicodeDir(std::path::PathBuf),
    #[error(transparent)]
    Tera(#[from] tera::Error),
}

pub fn has_template(tera: &Tera, name: &str) -> bool {
    tera.get_template_names().any(|n| n == name)
}

/// All `*.html` files below `dir`, named by their path relative to
/// `dir`.
pub fn templates_from_dir(dir: &Path) -> Result<Tera, TemplateError> {
    let dir_str = dir.to_str().ok_or_else(
        || TemplateError::NonUnicodeDir(dir.into()))?;
    Ok(Tera::new(&format!("{}/**/*.html", dir_str.trim_end_matches('/')))?)
}

/// Build the template set for `settings`: the template directory (if
/// any), then `extra` (name, source) pairs, then the built-in
/// `breadcrumbs.html` if neither provided one. Registers the
/// `render_breadcrumbs` tag last, so it sees all of them.
pub fn load_templates(
    settings: &Settings,
    extra: &[(&str, &str)]
) -> Result<Tera, TemplateError> {
    let mut tera = match &settings.template_dir {
        Some(dir) => templates_from_dir(dir)?,
        None => Tera::default(),
    };
    if !extra.is_empty() {
        tera.add_raw_templates(extra.to_vec())?;
    }
    if !has_template(&tera, DEFAULT_BREADCRUMBS_TEMPLATE) {
        tera.add_raw_template(DEFAULT_BREADCRUMBS_TEMPLATE, BUILTIN_BREADCRUMBS_HTML)?;
    }
    templatetags::register(&mut tera, &settings.breadcrumbs_template)?;
    Ok(tera)
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tera::Context;

    use super::*;
    use crate::breadcrumbs::{BreadcrumbSlot, add_breadcrumb};
    use crate::context_processors::breadcrumbs;

    const PAGE: &str = "<div>{{ render_breadcrumbs(breadcrumbs=breadcrumbs) }}</div>";

    #[test]
    fn t_builtin_template() {
        let tera = load_templates(&Settings::default(), &[("page.html", PAGE)]).unwrap();
        let slot = BreadcrumbSlot::new();
        add_breadcrumb(&slot, "Home", Some("/"));
        add_breadcrumb(&slot, "Shop", None);
        let out = tera.render("page.html", &breadcrumbs(&slot)).unwrap();
        assert!(out.starts_with("<div><nav class=\"breadcrumb\""));
        // Tera's html escaping covers slashes, too
        assert!(out.contains("<a href=\"&#x2F;\">Home</a>"));
        assert!(out.contains("<span aria-current=\"page\">Shop</span>"));
        assert_eq!(out.matches("<li ").count(), 2);
    }

    #[test]
    fn t_builtin_template_empty() {
        let tera = load_templates(&Settings::default(), &[("page.html", PAGE)]).unwrap();
        assert_eq!(tera.render("page.html", &breadcrumbs(&BreadcrumbSlot::new())).unwrap(),
                   "<div></div>");
    }

    #[test]
    fn t_template_dir_and_setting() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nav")).unwrap();
        fs::write(dir.path().join("nav/crumbs.html"),
                  "{% for c in breadcrumbs %}({{ c.label }}){% endfor %}").unwrap();
        fs::write(dir.path().join("page.html"), PAGE).unwrap();
        let settings = Settings {
            breadcrumbs_template: "nav/crumbs.html".into(),
            template_dir: Some(dir.path().into()),
            ..Settings::default()
        };
        let tera = load_templates(&settings, &[]).unwrap();
        // the built-in one is still there as a fallback
        assert!(has_template(&tera, "breadcrumbs.html"));
        let slot = BreadcrumbSlot::new();
        add_breadcrumb(&slot, "a", None);
        add_breadcrumb(&slot, "b", None);
        assert_eq!(tera.render("page.html", &breadcrumbs(&slot)).unwrap(),
                   "<div>(a)(b)</div>");
    }

    #[test]
    fn t_overriding_builtin() {
        let tera = load_templates(
            &Settings::default(),
            &[("breadcrumbs.html", "{{ breadcrumbs | length }}"), ("page.html", PAGE)]).unwrap();
        let mut context = Context::new();
        context.insert("breadcrumbs", &vec![1, 2, 3]);
        assert_eq!(tera.render("page.html", &context).unwrap(), "<div>3</div>");
    }

    #[test]
    fn t_configured_template_missing() {
        let settings = Settings {
            breadcrumbs_template: "missing.html".into(),
            ..Settings::default()
        };
        assert!(matches!(load_templates(&settings, &[]),
                         Err(TemplateError::MissingTemplate(_))));
    }
}
