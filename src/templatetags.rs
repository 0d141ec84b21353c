//! The `render_breadcrumbs` inclusion tag: renders the breadcrumbs
//! template with just the trail, for embedding into a page.

use std::collections::HashMap;

use kstring::KString;
use tera::{Context, Function, Tera, Value};

use crate::templates::{TemplateError, has_template};

/// Name under which the tag is registered with Tera.
pub const RENDER_BREADCRUMBS: &str = "render_breadcrumbs";

pub struct RenderBreadcrumbs {
    // Snapshot of the template set at registration time
    tera: Tera,
    template_name: KString,
}

impl RenderBreadcrumbs {
    /// Fails if `tera` doesn't have `template_name`.
    pub fn new(tera: Tera, template_name: &str) -> Result<Self, TemplateError> {
        if !has_template(&tera, template_name) {
            return Err(TemplateError::MissingTemplate(template_name.into()))
        }
        Ok(RenderBreadcrumbs {
            tera,
            template_name: KString::from_ref(template_name),
        })
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Render using the `breadcrumbs` variable of a page context
    /// (rendering an empty trail if there is none).
    pub fn render(&self, context: &Context) -> Result<String, TemplateError> {
        Ok(self.render_value(context.get("breadcrumbs"))?)
    }

    fn render_value(&self, breadcrumbs: Option<&Value>) -> tera::Result<String> {
        let mut context = Context::new();
        match breadcrumbs {
            Some(v) => context.insert("breadcrumbs", v),
            None => context.insert("breadcrumbs", &Vec::<Value>::new()),
        }
        self.tera.render(&self.template_name, &context)
    }
}

/// `{{ render_breadcrumbs(breadcrumbs=breadcrumbs) }}`
impl Function for RenderBreadcrumbs {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.render_value(args.get("breadcrumbs")).map(Value::String)
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Register the tag with `tera`. Templates added to `tera` afterwards
/// are not visible to the tag.
pub fn register(tera: &mut Tera, template_name: &str) -> Result<(), TemplateError> {
    let tag = RenderBreadcrumbs::new(tera.clone(), template_name)?;
    tera.register_function(RENDER_BREADCRUMBS, tag);
    Ok(())
}
