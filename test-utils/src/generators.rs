//! Shared proptest generators for the transport and mock-server crates.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Generate a status code that the retry layer treats as retryable.
pub fn retryable_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(408u16),
        Just(429),
        Just(500),
        Just(502),
        Just(503),
        Just(504),
    ]
}

/// Generate a status code that terminates a request on first sight.
pub fn terminal_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(200u16),
        Just(201),
        Just(204),
        Just(301),
        Just(400),
        Just(401),
        Just(403),
        Just(404),
        Just(418),
        Just(422),
    ]
}

/// Generate a short duration suitable for paused-clock timing tests.
pub fn short_duration_strategy() -> impl Strategy<Value = Duration> {
    (0u64..500).prop_map(Duration::from_millis)
}

/// Generate a URL path segment without reserved characters.
pub fn path_segment_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,16}"
}

/// Generate a path template together with names of its placeholders and a
/// concrete path the template matches.
///
/// Placeholder names are `p0`, `p1`, ... so they never collide.
pub fn templated_path_strategy() -> impl Strategy<Value = (String, Vec<String>, String)> {
    prop::collection::vec((any::<bool>(), path_segment_strategy()), 1..5).prop_map(|segments| {
        let mut template = String::new();
        let mut names = Vec::new();
        let mut path = String::new();
        for (index, (is_placeholder, value)) in segments.into_iter().enumerate() {
            path.push('/');
            path.push_str(&value);
            template.push('/');
            if is_placeholder {
                let name = format!("p{index}");
                template.push_str(&format!("{{{name}}}"));
                names.push(name);
            } else {
                template.push_str(&value);
            }
        }
        (template, names, path)
    })
}

/// Generate a claim map: claims renamed to an attribute or dropped.
pub fn claim_map_strategy() -> impl Strategy<Value = HashMap<String, Option<String>>> {
    prop::collection::hash_map(
        "[a-z][a-z_]{2,9}",
        prop::option::of("[a-z][a-z_]{2,9}"),
        0..5,
    )
}
