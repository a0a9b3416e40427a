use std::collections::HashMap;

/// Decode the query string of `url` into a key/value map.
pub fn query_pairs(url: &str) -> HashMap<String, String> {
    let (_, query) = url.split_once('?').unwrap();
    query
        .split('&')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap();
            (key.to_string(), urlencoding::decode(value).unwrap().into_owned())
        })
        .collect()
}
