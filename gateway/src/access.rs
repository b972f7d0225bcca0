// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Path/method allowlist evaluation.
//!
//! Rules are checked in declaration order and the first rule whose path prefix
//! and method set both match admits the request. Anything else is denied,
//! including every request to an endpoint with an empty allowlist.
//!
//! Prefixes are compared as plain strings, not path segments: a `/users` rule
//! also admits `/userstats`. Configurations that need a segment boundary should
//! declare the prefix with a trailing slash.
//!
//! Paths containing `.` or `..` segments, literal or percent-encoded, are
//! denied outright: the upstream URL resolves them, so the forwarded path would
//! differ from the one checked here.

use crate::models::{AllowedPath, Endpoint};

/// Returns the first rule admitting `method` on `path`, if any.
pub fn matching_rule<'a>(
    allowlist: &'a [AllowedPath],
    path: &str,
    method: &str,
) -> Option<&'a AllowedPath> {
    allowlist.iter().find(|rule| {
        path.starts_with(rule.path.as_str())
            && rule.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    })
}

/// True if any segment of `path` is `.` or `..` once `%2e` is decoded.
/// Backslashes count as separators, as they do in `http(s)` URLs.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// `path` is the upstream-relative path, with the routing prefix already removed.
pub fn is_allowed(endpoint: &Endpoint, path: &str, method: &str) -> bool {
    !has_dot_segment(path) && matching_rule(&endpoint.allowlist, path, method).is_some()
}
