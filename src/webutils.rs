use std::borrow::Cow;

use anyhow::Result;
use rouille::{Response, ResponseBody};
use tera::{Context, Tera};

use crate::http_response_status_codes::HttpResponseStatusCode;


pub fn errorpage_from_status(status: HttpResponseStatusCode) -> Response {
    let title = status.title();
    let explanation = status.desc();
    let resp = format!("<html><head><title>{title}</title></head><body><h1>{title}</h1>\
                        <p>{explanation}</p></body></html>\n");
    htmlresponse(status, resp)
}

pub fn htmlresponse(status: HttpResponseStatusCode, html: String) -> Response {
    Response {
        status_code: status.code(),
        headers: vec![(Cow::from("Content-type"),
                       Cow::from("text/html; charset=utf-8"))],
        data: ResponseBody::from_string(html),
        upgrade: None,
    }
}

/// Render `template` from `tera` into a 200 response.
pub fn render_response(tera: &Tera, template: &str, context: &Context) -> Result<Response> {
    Ok(htmlresponse(HttpResponseStatusCode::OK200, tera.render(template, context)?))
}
