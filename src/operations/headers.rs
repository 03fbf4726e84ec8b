//! Cache header helpers shared by the shipped operations.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use chrono::{DateTime, NaiveDateTime, Utc};
use time::{Duration, OffsetDateTime};

use crate::request::RequestContext;

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Offset applied to `Expires` when a response must never be served stale.
const STALE_EXPIRES: Duration = Duration::days(10 * 365);

/// Format an instant as an RFC 7231 IMF-fixdate
/// (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn format_http_date(instant: OffsetDateTime) -> String {
    let utc = DateTime::<Utc>::from_timestamp(instant.unix_timestamp(), 0).unwrap_or_default();
    utc.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date formats. Obsolete RFC 850 and asctime
/// forms still arrive from old intermediaries.
pub fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    for format in [IMF_FIXDATE, RFC_850_DATE, ASCTIME_DATE] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return OffsetDateTime::from_unix_timestamp(parsed.and_utc().timestamp()).ok();
        }
    }
    None
}

/// Mark the response as cacheable by the browser only, revalidated on every
/// use. `Expires` is set far in the past for agents that ignore
/// `must-revalidate`.
pub fn cache_in_browser(
    headers: &mut HeaderMap,
    etag: Option<&str>,
    last_modified: Option<OffsetDateTime>,
    now: OffsetDateTime,
) {
    set_validators(headers, etag, last_modified);
    insert(headers, header::EXPIRES, &format_http_date(now - STALE_EXPIRES));
    insert(
        headers,
        header::CACHE_CONTROL,
        "max-age=0, must-revalidate, private",
    );
}

/// Mark the response as cacheable by browsers and shared proxies for
/// `max_age` seconds.
pub fn cache_in_browser_and_proxy(
    headers: &mut HeaderMap,
    max_age: u32,
    etag: Option<&str>,
    last_modified: Option<OffsetDateTime>,
    now: OffsetDateTime,
) {
    set_validators(headers, etag, last_modified);
    insert(
        headers,
        header::EXPIRES,
        &format_http_date(now + Duration::seconds(i64::from(max_age))),
    );
    insert(
        headers,
        header::CACHE_CONTROL,
        &format!("max-age={max_age}, proxy-revalidate, public"),
    );
}

fn set_validators(headers: &mut HeaderMap, etag: Option<&str>, last_modified: Option<OffsetDateTime>) {
    if let Some(etag) = etag {
        insert(headers, header::ETAG, etag);
    }
    if let Some(instant) = last_modified {
        insert(headers, header::LAST_MODIFIED, &format_http_date(instant));
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Evaluate the request's conditional headers against the response
/// validators.
///
/// Returns false only when at least one conditional header is present and
/// every validator the request supplied still matches. A 304 requires all
/// supplied preconditions to hold at once.
pub fn is_modified(
    request: &RequestContext,
    etag: Option<&str>,
    last_modified: Option<OffsetDateTime>,
) -> bool {
    if etag.is_none() && last_modified.is_none() {
        return true;
    }

    let if_modified_since = request.if_modified_since.as_deref();
    let if_none_match = request.if_none_match.as_deref();
    if if_modified_since.is_none() && if_none_match.is_none() {
        return true;
    }

    if let (Some(header), Some(modified)) = (if_modified_since, last_modified) {
        // Some agents append a length hint after a semicolon.
        let header = header.split(';').next().unwrap_or(header);
        match parse_http_date(header) {
            // HTTP dates carry second precision.
            Some(since) => {
                if modified.unix_timestamp() > since.unix_timestamp() {
                    return true;
                }
            }
            None => return true,
        }
    }

    if let (Some(header), Some(etag)) = (if_none_match, etag) {
        if !etag_matches(header, etag) {
            return true;
        }
    }

    false
}

/// Check a quoted ETag against an `If-None-Match` candidate list.
pub fn etag_matches(header: &str, etag: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .map(|candidate| candidate.strip_prefix("W/").unwrap_or(candidate))
        .any(|candidate| candidate == etag)
}
