//! Typed view of the UI tree returned by `/dump`.
//!
//! The agent reports each view with its class, accessibility label, frame and
//! subviews. Only those keys are typed here; everything else the agent sends
//! (and that differs between Frank versions) is kept in [`ViewNode::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single view in the application's UI tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    /// The Objective-C class of the view (e.g., "UIButton").
    #[serde(rename = "class", default)]
    pub class: Option<String>,

    /// The accessibility label, typically the user-visible text.
    #[serde(rename = "accessibilityLabel", default)]
    pub label: Option<String>,

    /// The view's frame in its superview's coordinates.
    #[serde(default)]
    pub frame: Option<ViewFrame>,

    /// Views nested within this view.
    #[serde(default)]
    pub subviews: Vec<ViewNode>,

    /// Every other key reported by the agent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A view's frame, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub origin: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl ViewNode {
    /// Depth-first search for the first view whose accessibility label equals `label`.
    pub fn find_by_label(&self, label: &str) -> Option<&ViewNode> {
        if self.label.as_deref() == Some(label) {
            return Some(self);
        }
        self.subviews.iter().find_map(|view| view.find_by_label(label))
    }

    /// Total number of views in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.subviews.iter().map(ViewNode::count).sum::<usize>()
    }
}

/// Collects every view in the tree that carries an accessibility label,
/// in depth-first order. Unlabelled views are usually not addressable by
/// `marked:` queries, so they are skipped.
pub fn flatten_labelled(root: &ViewNode) -> Vec<&ViewNode> {
    let mut result = Vec::new();
    collect_labelled(root, &mut result);
    result
}

fn collect_labelled<'a>(view: &'a ViewNode, result: &mut Vec<&'a ViewNode>) {
    if view.label.is_some() {
        result.push(view);
    }
    for subview in &view.subviews {
        collect_labelled(subview, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> ViewNode {
        serde_json::from_value(json!({
            "class": "UIWindow",
            "uid": 1,
            "frame": {"origin": {"x": 0, "y": 0}, "size": {"width": 320, "height": 480}},
            "subviews": [
                {
                    "class": "UIButton",
                    "accessibilityLabel": "Done",
                    "subviews": []
                },
                {
                    "class": "UIView",
                    "subviews": [
                        {"class": "UILabel", "accessibilityLabel": "Title"}
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_known_and_extra_keys() {
        let tree = sample_tree();
        assert_eq!(tree.class.as_deref(), Some("UIWindow"));
        assert_eq!(tree.extra.get("uid"), Some(&json!(1)));
        let frame = tree.frame.unwrap();
        assert_eq!(frame.size.width, 320.0);
        assert_eq!(tree.subviews.len(), 2);
    }

    #[test]
    fn missing_fields_default() {
        let node: ViewNode = serde_json::from_str("{}").unwrap();
        assert!(node.class.is_none());
        assert!(node.subviews.is_empty());
    }

    #[test]
    fn find_by_label_searches_nested_views() {
        let tree = sample_tree();
        let title = tree.find_by_label("Title").unwrap();
        assert_eq!(title.class.as_deref(), Some("UILabel"));
        assert!(tree.find_by_label("Missing").is_none());
    }

    #[test]
    fn flatten_skips_unlabelled_views() {
        let tree = sample_tree();
        let labels: Vec<_> = flatten_labelled(&tree)
            .into_iter()
            .filter_map(|view| view.label.as_deref())
            .collect();
        assert_eq!(labels, vec!["Done", "Title"]);
        assert_eq!(tree.count(), 4);
    }
}
