//! Layer definitions: the closed set of visualizations the map client can ask for.

use serde::{Deserialize, Serialize};

/// The visualization layers offered by the API.
///
/// Tags match the map client's `layer` request field (`"TRUE_COLOR"`, etc.).
/// Unknown tags fall back to [`LayerKind::TrueColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    #[serde(rename = "TRUE_COLOR")]
    TrueColor,
    #[serde(rename = "FALSE_COLOR")]
    FalseColor,
    #[serde(rename = "NDVI")]
    Ndvi,
    #[serde(rename = "NDWI")]
    Ndwi,
}

impl LayerKind {
    /// Parse a request tag, defaulting to true color for anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "TRUE_COLOR" => LayerKind::TrueColor,
            "FALSE_COLOR" => LayerKind::FalseColor,
            "NDVI" => LayerKind::Ndvi,
            "NDWI" => LayerKind::Ndwi,
            _ => LayerKind::TrueColor,
        }
    }

    /// The request tag for this layer.
    pub fn tag(&self) -> &'static str {
        match self {
            LayerKind::TrueColor => "TRUE_COLOR",
            LayerKind::FalseColor => "FALSE_COLOR",
            LayerKind::Ndvi => "NDVI",
            LayerKind::Ndwi => "NDWI",
        }
    }

    /// Whether this layer needs a server-side band-math pass (normalized
    /// difference index) before compositing.
    pub fn is_index(&self) -> bool {
        matches!(self, LayerKind::Ndvi | LayerKind::Ndwi)
    }

    /// Visualization configuration for this layer.
    pub fn config(&self) -> &'static LayerConfig {
        match self {
            LayerKind::TrueColor => &TRUE_COLOR,
            LayerKind::FalseColor => &FALSE_COLOR,
            LayerKind::Ndvi => &NDVI,
            LayerKind::Ndwi => &NDWI,
        }
    }
}

/// Band selection and value-range configuration for one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerConfig {
    /// Bands selected from the composite for display.
    pub bands: &'static [&'static str],
    /// Lower bound of the display range.
    pub min: f64,
    /// Upper bound of the display range.
    pub max: f64,
    /// Color palette for single-band index layers.
    pub palette: Option<&'static [&'static str]>,
    /// Human-readable description returned in `layer_info`.
    pub description: &'static str,
}

static TRUE_COLOR: LayerConfig = LayerConfig {
    bands: &["B4", "B3", "B2"],
    min: 0.0,
    max: 3000.0,
    palette: None,
    description: "True color (RGB)",
};

static FALSE_COLOR: LayerConfig = LayerConfig {
    bands: &["B8", "B4", "B3"],
    min: 0.0,
    max: 3000.0,
    palette: None,
    description: "False color (NIR)",
};

static NDVI: LayerConfig = LayerConfig {
    bands: &["NDVI"],
    min: -1.0,
    max: 1.0,
    palette: Some(&["red", "yellow", "green"]),
    description: "NDVI - Normalized Difference Vegetation Index",
};

static NDWI: LayerConfig = LayerConfig {
    bands: &["NDWI"],
    min: -1.0,
    max: 1.0,
    palette: Some(&["white", "blue"]),
    description: "NDWI - Normalized Difference Water Index",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_known() {
        assert_eq!(LayerKind::from_tag("NDVI"), LayerKind::Ndvi);
        assert_eq!(LayerKind::from_tag("FALSE_COLOR"), LayerKind::FalseColor);
    }

    #[test]
    fn test_from_tag_unknown_falls_back_to_true_color() {
        assert_eq!(LayerKind::from_tag("THERMAL"), LayerKind::TrueColor);
        assert_eq!(LayerKind::from_tag(""), LayerKind::TrueColor);
    }

    #[test]
    fn test_true_color_config() {
        let config = LayerKind::TrueColor.config();
        assert_eq!(config.bands, &["B4", "B3", "B2"]);
        assert_eq!(config.max, 3000.0);
        assert!(config.palette.is_none());
    }

    #[test]
    fn test_index_layers_have_palettes() {
        for kind in [LayerKind::Ndvi, LayerKind::Ndwi] {
            assert!(kind.is_index());
            let config = kind.config();
            assert_eq!(config.bands.len(), 1);
            assert!(config.palette.is_some());
        }
    }
}
