//! Labeled regions produced by inference

use serde::Serialize;

/// Axis-aligned bounding box, serialized as `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect(pub f32, pub f32, pub f32, pub f32);

impl Rect {
    /// Box width
    pub fn width(&self) -> f32 {
        self.2 - self.0
    }

    /// Box height
    pub fn height(&self) -> f32 {
        self.3 - self.1
    }
}

/// A 2D point, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point(pub f32, pub f32);

/// One labeled region in an inference result
///
/// Object detections carry a class label and a bounding box; recognized
/// text carries the string and a polygon of at least three points.
/// Serializes untagged, so the wire shape is determined by the fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Region {
    /// A detected object
    Object {
        /// Class label
        label: String,
        /// Detection confidence in [0, 1]
        confidence: f32,
        /// Bounding box
        bbox: Rect,
    },
    /// A recognized piece of text
    Text {
        /// Recognized string
        text: String,
        /// Recognition confidence in [0, 1]
        confidence: f32,
        /// Bounding polygon (at least 3 points)
        bbox: Vec<Point>,
    },
}

impl Region {
    /// Create an object detection region
    pub fn object(label: impl Into<String>, confidence: f32, bbox: Rect) -> Self {
        Region::Object {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Create a text region
    pub fn text(text: impl Into<String>, confidence: f32, polygon: Vec<Point>) -> Self {
        Region::Text {
            text: text.into(),
            confidence,
            bbox: polygon,
        }
    }

    /// The region's confidence
    pub fn confidence(&self) -> f32 {
        match self {
            Region::Object { confidence, .. } | Region::Text { confidence, .. } => *confidence,
        }
    }

    /// The class label for object regions
    pub fn label(&self) -> Option<&str> {
        match self {
            Region::Object { label, .. } => Some(label),
            Region::Text { .. } => None,
        }
    }

    /// Whether the region's geometry is well formed
    ///
    /// Text polygons need at least three points to describe an area.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Region::Object { .. } => true,
            Region::Text { bbox, .. } => bbox.len() >= 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_serializes_like_a_detection() {
        let region = Region::object("person", 0.91, Rect(10.0, 20.0, 110.0, 220.0));
        let json = serde_json::to_value(&region).unwrap();

        assert_eq!(json["label"], "person");
        assert_eq!(json["bbox"][0], 10.0);
        assert_eq!(json["bbox"][3], 220.0);
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_text_serializes_with_polygon() {
        let region = Region::text(
            "EXIT",
            0.77,
            vec![Point(0.0, 0.0), Point(4.0, 0.0), Point(4.0, 2.0), Point(0.0, 2.0)],
        );
        let json = serde_json::to_value(&region).unwrap();

        assert_eq!(json["text"], "EXIT");
        assert_eq!(json["bbox"][2][1], 2.0);
        assert!(json.get("label").is_none());
    }

    #[test]
    fn test_degenerate_polygon_is_rejected() {
        let two_points = Region::text("x", 0.9, vec![Point(0.0, 0.0), Point(1.0, 1.0)]);
        assert!(!two_points.is_well_formed());

        let triangle = Region::text(
            "x",
            0.9,
            vec![Point(0.0, 0.0), Point(1.0, 0.0), Point(0.5, 1.0)],
        );
        assert!(triangle.is_well_formed());
    }

    #[test]
    fn test_rect_dimensions() {
        let r = Rect(5.0, 10.0, 25.0, 50.0);
        assert_eq!(r.width(), 20.0);
        assert_eq!(r.height(), 40.0);
    }
}
