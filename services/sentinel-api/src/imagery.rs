//! Translates one image request into Earth Engine expressions.
//!
//! The pipeline mirrors what the map client expects: load the harmonized
//! Sentinel-2 surface-reflectance collection, filter by date, bounds, and
//! scene cloudiness, optionally map per-image transforms (index band math,
//! SCL cloud mask), then composite with a median reducer and select the
//! layer's display bands. Everything here only *describes* the
//! computation; Earth Engine executes it.

use gee_client::{Expression, ExpressionBuilder, NodeRef, VisRange, VisualizationOptions};
use sentinel_common::{BoundingBox, LayerKind};

/// Harmonized Sentinel-2 surface reflectance collection.
pub const COLLECTION_ID: &str = "COPERNICUS/S2_SR_HARMONIZED";

/// Feature collection holding the selectable regions.
pub const REGIONS_TABLE_ID: &str = "projects/ee-romantik1994/assets/region";

/// Region feature attribute aggregated into the regions list.
pub const REGIONS_ATTRIBUTE: &str = "title";

/// SCL classes kept by the cloud mask: vegetation, bare soil, water,
/// unclassified. Everything else (clouds, shadows, snow, defects) is masked.
const CLEAR_SCL_CLASSES: [i64; 4] = [4, 5, 6, 7];

/// One image request, already validated and defaulted.
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub bbox: BoundingBox,
    pub start_date: String,
    pub end_date: String,
    pub cloud_filter: f64,
    pub smoothing: bool,
    pub layer: LayerKind,
}

impl ImageQuery {
    /// Expression for the median composite with the layer's display bands.
    pub fn composite_expression(&self) -> Expression {
        let mut b = ExpressionBuilder::new();
        let collection = self.filtered_collection(&mut b);
        let composite = b.invoke("reduce.median", &[("collection", collection)]);
        let bands = b.constant(self.layer.config().bands.to_vec());
        let selected = b.invoke(
            "Image.select",
            &[("input", composite), ("bandSelectors", bands)],
        );
        b.build(selected)
    }

    /// Expression counting the images that survive the filters. Evaluated
    /// as a second synchronous round-trip after the map is created.
    pub fn count_expression(&self) -> Expression {
        let mut b = ExpressionBuilder::new();
        let collection = self.filtered_collection(&mut b);
        let size = b.invoke("Collection.size", &[("collection", collection)]);
        b.build(size)
    }

    /// Display-range and palette options for the layer.
    pub fn visualization(&self) -> VisualizationOptions {
        let config = self.layer.config();
        VisualizationOptions {
            ranges: vec![VisRange {
                min: config.min,
                max: config.max,
            }],
            palette: config
                .palette
                .map(|p| p.iter().map(|c| c.to_string()).collect()),
        }
    }

    /// The filtered (and possibly mapped) image collection.
    fn filtered_collection(&self, b: &mut ExpressionBuilder) -> NodeRef {
        let id = b.constant(COLLECTION_ID);
        let mut collection = b.invoke("ImageCollection.load", &[("id", id)]);

        // Acquisition window
        let start = b.constant(self.start_date.as_str());
        let end = b.constant(self.end_date.as_str());
        let range = b.invoke("DateRange", &[("start", start), ("end", end)]);
        let time_field = b.constant("system:time_start");
        let date_filter = b.invoke(
            "Filter.dateRangeContains",
            &[("leftValue", range), ("rightField", time_field)],
        );
        collection = b.invoke(
            "Collection.filter",
            &[("collection", collection), ("filter", date_filter)],
        );

        // Footprint intersection with the request bounds
        let west = b.constant(self.bbox.min_lon);
        let south = b.constant(self.bbox.min_lat);
        let east = b.constant(self.bbox.max_lon);
        let north = b.constant(self.bbox.max_lat);
        let geometry = b.invoke(
            "GeometryConstructors.BBox",
            &[
                ("west", west),
                ("south", south),
                ("east", east),
                ("north", north),
            ],
        );
        let all = b.constant(".all");
        let bounds_filter = b.invoke(
            "Filter.intersects",
            &[("leftField", all), ("rightValue", geometry)],
        );
        collection = b.invoke(
            "Collection.filter",
            &[("collection", collection), ("filter", bounds_filter)],
        );

        // Scene-level cloudiness threshold
        let field = b.constant("CLOUDY_PIXEL_PERCENTAGE");
        let threshold = b.constant(self.cloud_filter);
        let cloud_filter = b.invoke(
            "Filter.lessThan",
            &[("leftField", field), ("rightValue", threshold)],
        );
        collection = b.invoke(
            "Collection.filter",
            &[("collection", collection), ("filter", cloud_filter)],
        );

        // Per-image band math for index layers
        if self.layer.is_index() {
            let algorithm = index_function(b, self.layer);
            collection = b.invoke(
                "Collection.map",
                &[("collection", collection), ("baseAlgorithm", algorithm)],
            );
        }

        // Per-pixel cloud mask
        if self.smoothing {
            let algorithm = cloud_mask_function(b);
            collection = b.invoke(
                "Collection.map",
                &[("collection", collection), ("baseAlgorithm", algorithm)],
            );
        }

        collection
    }
}

/// Expression aggregating the region titles from the fixed feature table.
pub fn regions_expression() -> Expression {
    let mut b = ExpressionBuilder::new();
    let id = b.constant(REGIONS_TABLE_ID);
    let table = b.invoke("Collection.loadTable", &[("tableId", id)]);
    let attribute = b.constant(REGIONS_ATTRIBUTE);
    let array = b.invoke(
        "AggregateFeatureCollection.array",
        &[("collection", table), ("property", attribute)],
    );
    b.build(array)
}

/// Mapped per-image cloud mask: keep pixels whose SCL class is clear,
/// then resample bilinearly so masked composites stay smooth.
fn cloud_mask_function(b: &mut ExpressionBuilder) -> NodeRef {
    let img = b.argument("img");
    let scl_band = b.constant(vec!["SCL"]);
    let scl = b.invoke("Image.select", &[("input", img), ("bandSelectors", scl_band)]);

    let mut allowed = scl_class_mask(b, scl, CLEAR_SCL_CLASSES[0]);
    for class in &CLEAR_SCL_CLASSES[1..] {
        let mask = scl_class_mask(b, scl, *class);
        allowed = b.invoke("Image.or", &[("image1", allowed), ("image2", mask)]);
    }

    let masked = b.invoke("Image.updateMask", &[("image", img), ("mask", allowed)]);
    let mode = b.constant("bilinear");
    let resampled = b.invoke("Image.resample", &[("image", masked), ("mode", mode)]);
    b.function(&["img"], resampled)
}

fn scl_class_mask(b: &mut ExpressionBuilder, scl: NodeRef, class: i64) -> NodeRef {
    let value = b.constant(class);
    let constant = b.invoke("Image.constant", &[("value", value)]);
    b.invoke("Image.eq", &[("image1", scl), ("image2", constant)])
}

/// Mapped normalized-difference band math for the index layers, appended
/// as a named band so the composite can select it.
fn index_function(b: &mut ExpressionBuilder, layer: LayerKind) -> NodeRef {
    let (band_pair, name) = match layer {
        LayerKind::Ndvi => (vec!["B8", "B4"], "NDVI"),
        LayerKind::Ndwi => (vec!["B3", "B8"], "NDWI"),
        _ => unreachable!("index_function called for non-index layer"),
    };

    let img = b.argument("img");
    let bands = b.constant(band_pair);
    let difference = b.invoke(
        "Image.normalizedDifference",
        &[("input", img), ("bandNames", bands)],
    );
    let names = b.constant(vec![name]);
    let renamed = b.invoke("Image.rename", &[("input", difference), ("names", names)]);
    let with_band = b.invoke(
        "Image.addBands",
        &[("dstImg", img), ("srcImg", renamed)],
    );
    b.function(&["img"], with_band)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(layer: LayerKind, smoothing: bool) -> ImageQuery {
        ImageQuery {
            bbox: BoundingBox::new(30.0, 45.0, 32.0, 47.0),
            start_date: "2024-06-01".to_string(),
            end_date: "2024-06-30".to_string(),
            cloud_filter: 30.0,
            smoothing,
            layer,
        }
    }

    fn functions_used(expr: &Expression) -> Vec<String> {
        expr.as_json()["values"]
            .as_object()
            .unwrap()
            .values()
            .filter_map(|v| v.get("functionInvocationValue"))
            .map(|inv| inv["functionName"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_true_color_composite_pipeline() {
        let expr = query(LayerKind::TrueColor, true).composite_expression();
        let used = functions_used(&expr);

        assert!(used.contains(&"ImageCollection.load".to_string()));
        assert!(used.contains(&"Filter.dateRangeContains".to_string()));
        assert!(used.contains(&"Filter.intersects".to_string()));
        assert!(used.contains(&"Filter.lessThan".to_string()));
        assert!(used.contains(&"reduce.median".to_string()));
        // true color has no band math
        assert!(!used.contains(&"Image.normalizedDifference".to_string()));
    }

    #[test]
    fn test_ndvi_adds_band_math_before_compositing() {
        let expr = query(LayerKind::Ndvi, true).composite_expression();
        let used = functions_used(&expr);

        assert!(used.contains(&"Image.normalizedDifference".to_string()));
        assert!(used.contains(&"Image.rename".to_string()));
        assert_eq!(
            used.iter().filter(|f| *f == "Collection.map").count(),
            2,
            "index math and cloud mask are separate mapped passes"
        );
    }

    #[test]
    fn test_smoothing_off_skips_cloud_mask() {
        let expr = query(LayerKind::TrueColor, false).composite_expression();
        let used = functions_used(&expr);

        assert!(!used.contains(&"Image.updateMask".to_string()));
        assert!(!used.contains(&"Collection.map".to_string()));
    }

    #[test]
    fn test_cloud_mask_keeps_four_scl_classes() {
        let expr = query(LayerKind::TrueColor, true).composite_expression();
        let used = functions_used(&expr);

        assert_eq!(used.iter().filter(|f| *f == "Image.eq").count(), 4);
        assert_eq!(used.iter().filter(|f| *f == "Image.or").count(), 3);
        assert!(used.contains(&"Image.resample".to_string()));
    }

    #[test]
    fn test_count_expression_ends_in_collection_size() {
        let expr = query(LayerKind::TrueColor, true).count_expression();
        let json = expr.as_json();
        let result_key = json["result"].as_str().unwrap();
        assert_eq!(
            json["values"][result_key]["functionInvocationValue"]["functionName"],
            "Collection.size"
        );
    }

    #[test]
    fn test_regions_expression_aggregates_title() {
        let expr = regions_expression();
        let serialized = serde_json::to_string(expr.as_json()).unwrap();
        assert!(serialized.contains("AggregateFeatureCollection.array"));
        assert!(serialized.contains(REGIONS_TABLE_ID));
        assert!(serialized.contains(REGIONS_ATTRIBUTE));
    }

    #[test]
    fn test_ndvi_visualization_has_palette() {
        let vis = query(LayerKind::Ndvi, true).visualization();
        assert_eq!(vis.ranges[0].min, -1.0);
        assert_eq!(vis.ranges[0].max, 1.0);
        assert_eq!(
            vis.palette.as_deref(),
            Some(&["red".to_string(), "yellow".to_string(), "green".to_string()][..])
        );
    }
}
