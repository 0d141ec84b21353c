//! Write HTTP access log files in the Combined Log Format (extended
//! Common Log Format) for access logs (Apache style), as per
//! <https://httpd.apache.org/docs/2.4/logs.html>.

use std::fs::{create_dir_all, OpenOptions};
use std::io::{stderr, BufWriter, Write};
use std::mem::swap;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Result, Context, anyhow};
use chrono::{DateTime, Datelike, Timelike, Utc};
use rouille::{Request, Response, ResponseBody};

use crate::acontext::AContext;
use crate::http_response_status_codes::HttpResponseStatusCode;
use crate::warn;
use crate::webutils::errorpage_from_status;

static MONTHS: &[&str; 12] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun",
    "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// "06/Dec/2023:02:02:47 +0000"
pub fn write_time(
    outp: &mut impl Write,
    time: SystemTime
) -> Result<()> {
    let dt: DateTime<Utc> = DateTime::from(time);
    write!(outp, "{:02}/{}/{:04}:{:02}:{:02}:{:02} +0000",
           dt.day(), MONTHS[dt.month0() as usize], dt.year(),
           dt.hour(), dt.minute(), dt.second())?;
    Ok(())
}

/// The size of the response body if known. `Response` has no
/// accessor for it, thus take the body apart and put it back.
fn response_body_len(response: &mut Response) -> Option<usize> {
    let mut body = ResponseBody::empty();
    swap(&mut body, &mut response.data);
    let (data, length) = body.into_reader_and_size();
    body = match length {
        Some(len) => ResponseBody::from_reader_and_size(data, len),
        None => ResponseBody::from_reader(data),
    };
    swap(&mut body, &mut response.data);
    length
}

// Apache:
// 44.212.94.18 - - [06/Dec/2023:02:38:18 +0100] "GET /resume/nontechnical.html HTTP/1.1" 200 2403 "-" "CCBot/2.0 (https://commoncrawl.org/faq/)"
// We also add duration at the end.

/// Like the request part in Apache style Combined Log Format
pub fn request_line(request: &Request) -> String {
    // `Request` does not keep the original request line string,
    // thus have to reconstruct it.
    format!("{} {}", request.method(), request.raw_url())
}

/// Write one access.log entry.
pub fn write_combined(
    outp: &mut impl Write,
    request: &Request,
    duration: Duration,
    response: &mut Response, // temporarily swaps out ResponseBody and back
) -> Result<()> {
    // The time when the log entry is made, not when the request
    // started
    let now = SystemTime::now();
    write!(outp, "{} - - [", request.remote_addr().ip())?;
    write_time(outp, now)?;
    let len = response_body_len(response);
    writeln!(outp, "] {:?} {} {} {:?} {:?} {duration:?}",
             request_line(request),
             response.status_code,
             len.unwrap_or(0),
             request.header("referer").unwrap_or("-"),
             request.header("user-agent").unwrap_or("-")
    )?;
    outp.flush()?;
    Ok(())
}

/// Write the access.log entry for `response`, then hand it back.
pub fn log_response(
    logs: &Mutex<Logs>,
    request: &Request,
    duration: Duration,
    mut response: Response,
) -> Response {
    let mut logs = logs.lock().expect(
        "if `write` panics then we are lost anyway");
    if let Err(e) = write_combined(&mut logs.access_log, request, duration, &mut response) {
        warn!("could not write to access log: {e:#}");
    }
    response
}

/// Write one error.log entry.
pub fn write_error(
    outp: &mut impl Write,
    context: &AContext,
    duration: Duration,
    err: &anyhow::Error,
) -> Result<()> {
    let now = SystemTime::now();
    write!(outp, "[")?;
    write_time(outp, now)?;
    writeln!(outp, "] [error] [client {}] {:?} {duration:?}: {err:#}",
             context.client_ip(),
             context.request_line())?;
    outp.flush()?;
    Ok(())
}

fn write_panic_stderr(
    context: &AContext,
    duration: Duration
) {
    let mut outp = BufWriter::new(stderr().lock());
    // stderr is expected to be fed to a service that adds
    // timestamps, hence don't print them.
    let _ = writeln!(&mut outp, "[panic] handling {:?} after {duration:?}",
                     context.request_line());
    let _ = outp.flush();
}


/// The log outputs: access_log for responses from handlers,
/// error_log for handler errors. The code calls flush once per
/// entry.
pub struct Logs {
    pub access_log: Box<dyn Write + Send + Sync>,
    pub error_log: Box<dyn Write + Send + Sync>,
}

fn open_log_output(path: &Path) -> Result<Box<dyn Write + Send + Sync>> {
    let file = OpenOptions::new().create(true).append(true).open(path)
        .with_context(|| anyhow!("can't open log file for appending: {path:?}"))?;
    Ok(Box::new(BufWriter::new(file)))
}

impl Logs {
    pub fn stderr() -> Arc<Mutex<Logs>> {
        Arc::new(Mutex::new(Logs {
            access_log: Box::new(stderr()),
            error_log: Box::new(stderr()),
        }))
    }

    /// `access.log` and `error.log` in `logdir`, which is created if
    /// missing.
    pub fn open_in_dir(logdir: &Path) -> Result<Arc<Mutex<Logs>>> {
        create_dir_all(logdir).with_context(
            || anyhow!("can't create log directory {logdir:?}"))?;
        Ok(Arc::new(Mutex::new(Logs {
            access_log: open_log_output(&logdir.join("access.log"))?,
            error_log: open_log_output(&logdir.join("error.log"))?,
        })))
    }
}


/// Run `handler`, logging its outcome. Errors become a 500 error
/// page; panics are logged to stderr, then resumed.
pub fn log_combined<F>(
    context: &AContext,
    logs: &Mutex<Logs>,
    handler: F
) -> Response
where
    F: FnOnce() -> anyhow::Result<Response>,
{
    let start_instant = Instant::now();
    let result = panic::catch_unwind(panic::AssertUnwindSafe(handler));
    let elapsed = start_instant.elapsed();

    match result {
        Ok(Ok(response)) => log_response(logs, context.request(), elapsed, response),
        Ok(Err(err)) => {
            {
                let mut logs = logs.lock().expect(
                    "if `write` panics then we are lost anyway");
                if let Err(e) = write_error(&mut logs.error_log, context, elapsed, &err) {
                    warn!("could not write to error log: {e:#}");
                }
            }
            errorpage_from_status(HttpResponseStatusCode::InternalServerError500)
        }
        Err(payload) => {
            write_panic_stderr(context, elapsed);
            // The panic handler will print the payload contents
            panic::resume_unwind(payload);
        }
    }
}
