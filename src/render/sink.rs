//! Outward render calls, and an in-memory SVG preview of them.

use std::io::Write;

use anyhow::{Context, Result};

use crate::render::{scene::Scene, transition::TransitionDescriptor};

/// The rendering boundary: receives every committed scene and transition.
pub trait RenderSink {
    /// Draw a scene without animation (initial render).
    fn draw(&mut self, scene: &Scene) -> Result<()>;

    /// Animate from `transition.start` to `transition.end`.
    fn transition(&mut self, transition: &TransitionDescriptor) -> Result<()>;
}

/// String-backed SVG writer.
struct SvgStringWriter {
    buffer: Vec<u8>,
}

impl Write for SvgStringWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

impl SvgStringWriter {
    fn new() -> Self { Self { buffer: Vec::new() } }

    fn into_string(self) -> Result<String> {
        String::from_utf8(self.buffer).context("[render::svg] SVG output is not valid UTF-8")
    }
}

/// Escape text for use in SVG content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render `scene` as a standalone SVG document.
pub fn scene_to_svg(scene: &Scene) -> Result<String> {
    let mut w = SvgStringWriter::new();
    let (width, height) = (scene.width, scene.height);
    let stroke = escape(scene.stroke.color.as_str());

    writeln!(w, r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##)?;
    if let Some(title) = &scene.labels.title {
        writeln!(w, r##"<text class="title" x="10" y="20">{}</text>"##, escape(title))?;
    }

    writeln!(w, r##"<g class="regions" stroke="{stroke}" stroke-width="{}">"##, scene.stroke.width)?;
    for region in &scene.regions {
        let attrs = format!(r##"class="region" data-id="{}" d="{}" fill="{}""##,
            escape(&region.id), region.path, escape(region.fill.as_str()));
        match &region.tooltip {
            Some(tip) => writeln!(w, r##"<path {attrs}><title>{}</title></path>"##, escape(tip))?,
            None => writeln!(w, r##"<path {attrs}/>"##)?,
        }
    }
    writeln!(w, "</g>")?;

    if !scene.mesh_path.is_empty() {
        writeln!(w, r##"<path class="mesh" d="{}" fill="none" stroke="{stroke}" stroke-width="{}"/>"##,
            scene.mesh_path, scene.stroke.width)?;
    }
    if let Some(caption) = &scene.labels.caption {
        writeln!(w, r##"<text class="caption" x="{}" y="{}" text-anchor="end">{}</text>"##,
            width - 10.0, height - 10.0, escape(caption))?;
    }
    writeln!(w, "</svg>")?;

    w.into_string()
}

/// Keeps the latest frame as an SVG string.
///
/// Transitions are recorded by sequence number and previewed at their end
/// state; nothing is written to disk.
#[derive(Debug, Default)]
pub struct SvgPreviewSink {
    document: Option<String>,
    transitions: Vec<u64>,
}

impl SvgPreviewSink {
    pub fn new() -> Self { Self::default() }

    /// SVG of the most recent frame.
    pub fn document(&self) -> Option<&str> { self.document.as_deref() }

    /// Sequence numbers of the transitions received, in order.
    pub fn transitions(&self) -> &[u64] { &self.transitions }
}

impl RenderSink for SvgPreviewSink {
    fn draw(&mut self, scene: &Scene) -> Result<()> {
        self.document = Some(scene_to_svg(scene)?);
        Ok(())
    }

    fn transition(&mut self, transition: &TransitionDescriptor) -> Result<()> {
        self.document = Some(scene_to_svg(&transition.end)?);
        self.transitions.push(transition.seq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiLineString, MultiPolygon};

    use super::*;
    use crate::{
        classify::Color,
        config::{Labels, Stroke},
        render::scene::RenderedRegion,
    };

    fn scene() -> Scene {
        let shape = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        Scene {
            width: 200.0,
            height: 100.0,
            regions: vec![RenderedRegion::new("a&b", shape, Color::from("#123456"), Some("<b>".into()))],
            mesh: MultiLineString(vec![]),
            mesh_path: String::new(),
            legend: None,
            labels: Labels { title: Some("Title".into()), caption: None },
            stroke: Stroke::default(),
            zoom: None,
        }
    }

    #[test]
    fn writes_regions_with_escaped_text() {
        let svg = scene_to_svg(&scene()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"data-id="a&amp;b""#));
        assert!(svg.contains(r##"fill="#123456""##));
        assert!(svg.contains("<title>&lt;b&gt;</title>"));
        assert!(svg.contains(">Title</text>"));
        assert!(!svg.contains(r#"class="mesh""#));
    }

    #[test]
    fn preview_sink_tracks_transitions() {
        let mut sink = SvgPreviewSink::new();
        assert!(sink.document().is_none());
        sink.draw(&scene()).unwrap();
        assert!(sink.document().is_some());

        let transition = TransitionDescriptor::new(3, scene(), scene());
        sink.transition(&transition).unwrap();
        assert_eq!(sink.transitions(), &[3]);
    }
}
