//! Decoder for the `shape_polyline` field of route details.
//!
//! The backend serves route geometry as a WKT linestring:
//! `LINESTRING(lon1 lat1, lon2 lat2, ...)`. The decoder swaps each pair into
//! the (lat, lon) order used everywhere else in this crate.
//!
//! Parsing is deliberately lenient: malformed coordinate pairs are skipped
//! individually and a string without a parenthesized body decodes to an empty
//! sequence. A partially drawn route is preferred over none, and callers rely
//! on that, so do not tighten this into a fail-fast parse.

/// Decode a WKT LINESTRING into ordered (lat, lon) pairs.
pub fn decode_linestring(wkt: &str) -> Vec<(f64, f64)> {
    let open = match wkt.find('(') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let close = match wkt.rfind(')') {
        Some(i) if i > open => i,
        _ => return Vec::new(),
    };

    let body = &wkt[open + 1..close];

    body.split(',')
        .filter_map(|pair| {
            let mut parts = pair.split_whitespace();
            let lon = parts.next()?.parse::<f64>().ok()?;
            let lat = parts.next()?.parse::<f64>().ok()?;
            Some((lat, lon))
        })
        .collect()
}
