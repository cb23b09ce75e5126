//! Node hierarchy queries

use crate::assets::model::AssetScene;
use crate::foundation::math::Mat4;

/// World transform of node `node`
///
/// Local transforms are collected from the node up to the root and then
/// multiplied root first: `Local(root) * ... * Local(parent) * Local(node)`.
/// A broken parent link or a cycle stops the walk with a warning.
#[must_use]
pub fn world_transform(asset: &AssetScene, node: usize) -> Mat4 {
    let mut stack = Vec::new();
    let mut current = Some(node);

    while let Some(index) = current {
        let Some(entry) = asset.nodes.get(index) else {
            log::warn!("Node {index} referenced in hierarchy does not exist");
            break;
        };
        if stack.len() >= asset.nodes.len() {
            log::warn!("Cycle in node hierarchy above node '{}'", entry.name);
            break;
        }
        stack.push(entry.local_matrix());
        current = entry.parent;
    }

    stack
        .iter()
        .rev()
        .fold(Mat4::identity(), |world, local| world * local)
}

/// Index of the first node called `name`
#[must_use]
pub fn find_node_by_name(asset: &AssetScene, name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    asset.nodes.iter().position(|node| node.name == name)
}

/// Index of the first node whose metadata `key` equals `index`
///
/// Metadata values are compared after normalization to a single integer, so
/// `I32(2)`, `U64(2)` and `String("2")` all match index 2.
#[must_use]
pub fn find_node_by_metadata_index(asset: &AssetScene, key: &str, index: usize) -> Option<usize> {
    let wanted = i64::try_from(index).ok()?;
    asset.nodes.iter().position(|node| {
        node.metadata
            .get(key)
            .and_then(|value| value.as_integer())
            == Some(wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::model::{AssetNode, MetadataValue};
    use crate::foundation::math::{Quat, Vec3, Vec4};
    use approx::assert_relative_eq;

    fn three_level_scene() -> (AssetScene, usize) {
        let mut asset = AssetScene::default();
        let root = asset.add_node(
            AssetNode::new("root").with_local_matrix(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0))),
            None,
        );
        let rotated = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let middle = asset.add_node(
            AssetNode::new("middle").with_local_matrix(&rotated.to_homogeneous()),
            Some(root),
        );
        let leaf = asset.add_node(
            AssetNode::new("leaf").with_local_matrix(&Mat4::new_translation(&Vec3::new(0.0, 0.0, 1.0))),
            Some(middle),
        );
        (asset, leaf)
    }

    #[test]
    fn test_world_transform_multiplies_root_first() {
        let (asset, leaf) = three_level_scene();
        let world = world_transform(&asset, leaf);

        let expected = asset.nodes[0].local_matrix() * asset.nodes[1].local_matrix() * asset.nodes[2].local_matrix();
        assert_relative_eq!(world, expected, epsilon = 1e-5);

        // Leaf offset (0,0,1) is rotated by the middle node onto +X, then moved by the root
        let origin = world * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.xyz(), Vec3::new(11.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_world_transform_of_root_is_local() {
        let (asset, _) = three_level_scene();
        assert_relative_eq!(world_transform(&asset, 0), asset.nodes[0].local_matrix());
    }

    #[test]
    fn test_cycle_terminates() {
        let mut asset = AssetScene::default();
        asset.add_node(AssetNode::new("a"), Some(1));
        asset.add_node(AssetNode::new("b"), Some(0));
        let world = world_transform(&asset, 0);
        assert_relative_eq!(world, Mat4::identity());
    }

    #[test]
    fn test_find_nodes() {
        let mut asset = AssetScene::default();
        asset.add_node(AssetNode::new("root"), None);
        asset.add_node(
            AssetNode::new("cam").with_metadata("camera_index", MetadataValue::String("1".into())),
            Some(0),
        );
        asset.add_node(
            AssetNode::new("other").with_metadata("camera_index", MetadataValue::U64(0)),
            Some(0),
        );

        assert_eq!(find_node_by_name(&asset, "cam"), Some(1));
        assert_eq!(find_node_by_name(&asset, ""), None);
        assert_eq!(find_node_by_metadata_index(&asset, "camera_index", 1), Some(1));
        assert_eq!(find_node_by_metadata_index(&asset, "camera_index", 0), Some(2));
        assert_eq!(find_node_by_metadata_index(&asset, "camera_index", 5), None);
    }
}
