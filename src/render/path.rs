//! SVG path data for device-space geometry.

use geo::{LineString, MultiLineString, MultiPolygon};

/// Append `line` as an SVG subpath: "M x,y L x,y ..." plus "Z" when `close`.
fn line_to_path(line: &LineString<f64>, close: bool, out: &mut String) {
    let Some((first, rest)) = line.0.split_first() else { return };
    if !out.is_empty() { out.push(' ') }
    out.push_str(&format!("M{:.3},{:.3}", first.x, first.y));
    // A closed ring repeats its first vertex; "Z" already returns there.
    let rest = if close && rest.last() == Some(first) { &rest[..rest.len() - 1] } else { rest };
    for c in rest {
        out.push_str(&format!(" L{:.3},{:.3}", c.x, c.y));
    }
    if close { out.push('Z') }
}

/// Compact path for a multipolygon: exteriors and holes as closed subpaths.
pub(crate) fn multipolygon_to_path(shape: &MultiPolygon<f64>) -> String {
    let mut out = String::new();
    for polygon in &shape.0 {
        line_to_path(polygon.exterior(), true, &mut out);
        for hole in polygon.interiors() {
            line_to_path(hole, true, &mut out);
        }
    }
    out
}

/// Open subpaths for a set of border lines.
pub(crate) fn lines_to_path(lines: &MultiLineString<f64>) -> String {
    let mut out = String::new();
    for line in &lines.0 {
        line_to_path(line, false, &mut out);
    }
    out
}
