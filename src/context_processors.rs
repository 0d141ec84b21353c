//! Functions turning a request into template variables, run for
//! every page render.

use tera::Context;

use crate::acontext::AContext;
use crate::breadcrumbs::{HasBreadcrumbs, get_breadcrumbs};

/// Makes the request's trail available as `breadcrumbs` (an empty
/// list if the handler didn't add any).
pub fn breadcrumbs<R: HasBreadcrumbs + ?Sized>(request: &R) -> Context {
    let mut context = Context::new();
    context.insert("breadcrumbs", &get_breadcrumbs(request));
    context
}

fn breadcrumbs_processor(request: &AContext) -> Context {
    breadcrumbs(request)
}

pub trait ContextProcessor: Send + Sync {
    fn process(&self, request: &AContext) -> Context;
}

impl<F> ContextProcessor for F
where F: Fn(&AContext) -> Context + Send + Sync
{
    fn process(&self, request: &AContext) -> Context {
        self(request)
    }
}

/// The processors run for a page, in registration order. Variables
/// from later processors replace same-named ones from earlier
/// processors.
#[derive(Default)]
pub struct ContextProcessors {
    processors: Vec<Box<dyn ContextProcessor>>,
}

impl ContextProcessors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Just the `breadcrumbs` processor.
    pub fn with_breadcrumbs() -> Self {
        let mut processors = Self::new();
        processors.add(breadcrumbs_processor);
        processors
    }

    pub fn add(&mut self, processor: impl ContextProcessor + 'static) -> &mut Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run all processors on `request`, merging their variables.
    pub fn context(&self, request: &AContext) -> Context {
        let mut context = Context::new();
        for processor in &self.processors {
            context.extend(processor.process(request));
        }
        context
    }
}
