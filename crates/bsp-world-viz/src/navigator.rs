//! Interactive inspection of a world's node arena.

use bsp_world::bsp::{BspNode, NodeIndex};
use bsp_world::vis::collect_leaves;
use bsp_world::World;
use macroquad::prelude::*;

use crate::draw_face;

/// Walks the arena with the keyboard: F/B descend, P goes up, R resets.
///
/// Only the current node is stored; parents come from the arena itself.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    current: Option<NodeIndex>,
}

impl TreeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected node, falling back to the root.
    pub fn current(&self, world: &World) -> Option<NodeIndex> {
        self.current.or(world.root())
    }

    fn current_node<'a>(&self, world: &'a World) -> Option<&'a BspNode> {
        self.current(world).and_then(|index| world.nodes().get(index))
    }

    fn go_child(&mut self, world: &World, which: usize) -> bool {
        let Some(children) = self.current_node(world).and_then(BspNode::children) else {
            return false;
        };
        self.current = Some(children[which]);
        true
    }

    pub fn go_front(&mut self, world: &World) -> bool {
        self.go_child(world, 0)
    }

    pub fn go_back(&mut self, world: &World) -> bool {
        self.go_child(world, 1)
    }

    /// Returns false at the root.
    pub fn go_parent(&mut self, world: &World) -> bool {
        match self.current_node(world).and_then(|node| node.parent) {
            Some(parent) => {
                self.current = Some(parent);
                true
            }
            None => false,
        }
    }

    pub fn go_root(&mut self) {
        self.current = None;
    }

    /// Handles keyboard input. Returns true if the selection changed.
    pub fn update(&mut self, world: &World) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed = self.go_front(world);
        }
        if is_key_pressed(KeyCode::B) {
            changed = self.go_back(world);
        }
        if is_key_pressed(KeyCode::P) {
            changed = self.go_parent(world);
        }
        if is_key_pressed(KeyCode::R) && self.current.is_some() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// Draws the faces of every leaf under the selected node, ignoring
    /// visibility marks.
    pub fn render(&self, world: &World) {
        let Some(index) = self.current(world) else {
            return;
        };
        for leaf in collect_leaves(world.nodes(), index) {
            if let Some(leaf) = world.nodes()[leaf].as_leaf() {
                for &face in &leaf.faces {
                    draw_face(&world.faces()[face]);
                }
            }
        }
    }

    /// Draws the node overlay.
    pub fn draw_ui(&self, world: &World, y_offset: f32) {
        let Some(index) = self.current(world) else {
            draw_text("Empty world", 10.0, y_offset, 18.0, ORANGE);
            return;
        };
        let node = &world.nodes()[index];

        let subtree_faces: usize = collect_leaves(world.nodes(), index)
            .into_iter()
            .filter_map(|leaf| world.nodes()[leaf].as_leaf())
            .map(|leaf| leaf.faces.len())
            .sum();
        let marked = node.visframe == world.vis_count();

        draw_text(
            &format!("Node {} | subtree: {} faces", index, subtree_faces),
            10.0,
            y_offset,
            18.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Contents: {} | cluster: {} | visframe: {}{}",
                node.contents(),
                node.cluster().map_or("-".to_string(), |c| c.to_string()),
                node.visframe,
                if marked { " (marked)" } else { "" }
            ),
            10.0,
            y_offset + 20.0,
            18.0,
            if marked { YELLOW } else { GRAY },
        );
        draw_text(
            &match node.children() {
                Some([front, back]) => format!("Children: [F]ront {} [B]ack {}", front, back),
                None => "Children: (leaf)".to_string(),
            },
            10.0,
            y_offset + 40.0,
            18.0,
            if node.is_leaf() { ORANGE } else { GREEN },
        );
        draw_text("[P]arent | [R]oot", 10.0, y_offset + 60.0, 16.0, DARKGRAY);
    }
}
