use serde::{Deserialize, Serialize};

use crate::classify::{
    color::Color,
    format::{shortest, NumberFormat},
    scale::{Policy, ScaleConfig},
};

/// Host-controlled legend text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendOptions {
    pub title: Option<String>,
    pub prefix: String,
    pub suffix: String,
    #[serde(alias = "d3_format")]
    pub number_format: Option<NumberFormat>,
}

impl LegendOptions {
    /// Label for a numeric tick: the number format when set, otherwise
    /// `prefix + value + suffix`.
    pub fn label(&self, value: f64) -> String {
        match &self.number_format {
            Some(format) => format.format(value),
            None => format!("{}{}{}", self.prefix, shortest(value), self.suffix),
        }
    }
}

/// Everything a renderer needs to lay out a legend; no pixel positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LegendDescriptor {
    pub title: Option<String>,
    pub ticks: Vec<f64>,
    pub colors: Vec<Color>,
    pub labels: Vec<String>,
    /// Value extent of each color bin; `None` marks an open end.
    pub extents: Vec<(Option<f64>, Option<f64>)>,
}

impl ScaleConfig {
    /// Legend for this scale.
    ///
    /// Open threshold bins are closed by the range given with the scale, or
    /// by `value_range` when the scale has none.  A closed end never crosses
    /// the break it bounds.
    pub fn legend(&self, options: &LegendOptions, value_range: Option<[f64; 2]>) -> LegendDescriptor {
        let title = options.title.clone();

        match &self.policy {
            Policy::Discrete { keys, colors, .. } => LegendDescriptor {
                title,
                ticks: Vec::new(),
                colors: colors.clone(),
                labels: keys.clone(),
                extents: Vec::new(),
            },
            Policy::Threshold { breaks, colors, range } => {
                let range = range.or(value_range);
                let lower = range.map(|[lo, _]| breaks.first().map_or(lo, |&b| lo.min(b)));
                let upper = range.map(|[_, hi]| breaks.last().map_or(hi, |&b| hi.max(b)));
                let bounds = std::iter::once(lower)
                    .chain(breaks.iter().map(|&b| Some(b)))
                    .chain(std::iter::once(upper))
                    .collect::<Vec<_>>();

                LegendDescriptor {
                    title,
                    ticks: breaks.clone(),
                    colors: colors.clone(),
                    labels: breaks.iter().map(|&b| options.label(b)).collect(),
                    extents: bounds.windows(2).map(|w| (w[0], w[1])).collect(),
                }
            }
            Policy::Gradient { domain: [lo, hi], stops, .. } => {
                let segments = (stops.len() - 1) as f64;
                let ticks = (0..stops.len())
                    .map(|i| lo + (hi - lo) * i as f64 / segments)
                    .collect::<Vec<_>>();

                LegendDescriptor {
                    title,
                    labels: ticks.iter().map(|&t| options.label(t)).collect(),
                    ticks,
                    colors: stops.clone(),
                    extents: Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use maptopo::AttrValue;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::classify::scale::ScaleSpec;

    fn colors(cs: &[&str]) -> Vec<Color> { cs.iter().map(|&c| Color::from(c)).collect() }

    fn scale(spec: ScaleSpec) -> ScaleConfig { ScaleConfig::new(spec, Color::from("#ccc")).unwrap() }

    #[test]
    fn threshold_legend_fills_open_extents_from_range() {
        let scale = scale(ScaleSpec::Threshold {
            breaks: vec![15.0, 50.0],
            colors: colors(&["#a", "#b", "#c"]),
            range: Some([0.0, 100.0]),
        });
        let options = LegendOptions { prefix: "~".into(), suffix: "%".into(), ..Default::default() };

        let legend = scale.legend(&options, None);
        assert_eq!(legend.ticks, vec![15.0, 50.0]);
        assert_eq!(legend.labels, vec!["~15%", "~50%"]);
        assert_eq!(legend.colors.len(), 3);
        assert_eq!(legend.extents, vec![
            (Some(0.0), Some(15.0)),
            (Some(15.0), Some(50.0)),
            (Some(50.0), Some(100.0)),
        ]);

        // The configured range wins over the observed one.
        let legend = scale.legend(&options, Some([-5.0, 70.0]));
        assert_eq!(legend.extents.first(), Some(&(Some(0.0), Some(15.0))));
        assert_eq!(legend.extents.last(), Some(&(Some(50.0), Some(100.0))));
    }

    #[test]
    fn observed_range_closes_bins_without_inverting_them() {
        let configured = scale(ScaleSpec::Threshold {
            breaks: vec![5.0, 50.0],
            colors: colors(&["#a", "#b", "#c"]),
            range: Some([0.0, 100.0]),
        });
        let legend = configured.legend(&LegendOptions::default(), Some([10.0, 70.0]));
        assert_eq!(legend.extents.first(), Some(&(Some(0.0), Some(5.0))));

        let observed = scale(ScaleSpec::Threshold { breaks: vec![5.0, 50.0], colors: colors(&["#a", "#b", "#c"]), range: None });
        let legend = observed.legend(&LegendOptions::default(), Some([10.0, 40.0]));
        assert_eq!(legend.extents, vec![
            (Some(5.0), Some(5.0)),
            (Some(5.0), Some(50.0)),
            (Some(50.0), Some(50.0)),
        ]);
        assert!(legend.extents.iter().all(|&(lo, hi)| lo <= hi));
    }

    #[test]
    fn threshold_legend_without_range_is_open_ended() {
        let scale = scale(ScaleSpec::Threshold { breaks: vec![1.0], colors: colors(&["#a", "#b"]), range: None });
        let legend = scale.legend(&LegendOptions::default(), None);
        assert_eq!(legend.extents, vec![(None, Some(1.0)), (Some(1.0), None)]);
        assert_eq!(legend.labels, vec!["1"]);
    }

    #[test]
    fn number_format_overrides_prefix_and_suffix() {
        let scale = scale(ScaleSpec::Gradient { domain: [0.0, 2000.0], colors: colors(&["#000", "#888", "#fff"]) });
        let options = LegendOptions {
            title: Some("Population".into()),
            prefix: "ignored".into(),
            number_format: Some(",.0f".parse().unwrap()),
            ..Default::default()
        };
        let legend = scale.legend(&options, None);
        assert_eq!(legend.title.as_deref(), Some("Population"));
        assert_eq!(legend.ticks, vec![0.0, 1000.0, 2000.0]);
        assert_eq!(legend.labels, vec!["0", "1,000", "2,000"]);
        assert!(legend.extents.is_empty());
    }

    #[test]
    fn discrete_legend_lists_categories() {
        let scale = scale(ScaleSpec::Discrete {
            values: vec![AttrValue::from("low"), AttrValue::Number(3.0)],
            colors: colors(&["#1", "#2"]),
        });
        let legend = scale.legend(&LegendOptions::default(), None);
        assert!(legend.ticks.is_empty());
        assert_eq!(legend.labels, vec!["low", "3"]);
        assert_eq!(legend.colors, colors(&["#1", "#2"]));
    }

    #[test]
    fn options_accept_d3_format_alias() {
        let options: LegendOptions = serde_json::from_str(r#"{ "title": "t", "d3_format": ".1%" }"#).unwrap();
        assert_eq!(options.label(0.25), "25.0%");
        assert!(serde_json::from_str::<LegendOptions>(r#"{ "number_format": "zz" }"#).is_err());
    }
}
