use crate::frame::FrameHandle;
use crate::node::{Node, NodeGeometry};
use lyon::math::Transform;
use smallvec::SmallVec;

const CHILD_SCRATCH_CAPACITY: usize = 16;

enum Phase {
    Begin,
    NodesBelow(usize),
    NodeSelf,
    NodesAbove(usize),
    End,
}

/// Scene graph driving the per-frame visit protocol.
///
/// A single depth-first pass per frame. Every visited node sees the phase
/// sequence begin, nodes-below, below children, self, nodes-above, above
/// children, end; its components receive each phase through
/// [`crate::node::SceneComponent`]. Children with negative order draw
/// below their parent, sorted ascending within each half. Invisible nodes
/// are skipped together with their whole subtree.
pub struct SceneTree {
    tree: easy_tree::Tree<Node>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self { tree: easy_tree::Tree::new() }
    }

    /// Adds the root node. Call once, before any `add_child`.
    pub fn add_root(&mut self, node: Node) -> usize {
        self.tree.add_node(node)
    }

    pub fn add_child(&mut self, parent: usize, node: Node) -> usize {
        self.tree.add_child(parent, node)
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.tree.get(id)
    }

    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.tree.get_mut(id)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Walks the whole tree once, delivering visit phases to every
    /// component and recording draws into the frame.
    pub fn visit(&mut self, frame: &mut FrameHandle<'_>) {
        if self.tree.is_empty() {
            return;
        }
        self.visit_node(0, &Transform::identity(), frame);
    }

    fn visit_node(&mut self, id: usize, parent_world: &Transform, frame: &mut FrameHandle<'_>) {
        let geometry = {
            let node = match self.tree.get_mut(id) {
                Some(node) => node,
                None => return,
            };
            node.geometry = NodeGeometry {
                content_size: node.content_size,
                world_transform: node.local_transform.then(parent_world),
            };
            if !node.visible {
                return;
            }
            node.geometry
        };

        let mut below: SmallVec<[(i32, usize); CHILD_SCRATCH_CAPACITY]> = SmallVec::new();
        let mut above: SmallVec<[(i32, usize); CHILD_SCRATCH_CAPACITY]> = SmallVec::new();
        for &child_id in self.tree.children(id) {
            let order = match self.tree.get(child_id) {
                Some(child) => child.order,
                None => continue,
            };
            if order < 0 {
                below.push((order, child_id));
            } else {
                above.push((order, child_id));
            }
        }
        below.sort_by_key(|&(order, _)| order);
        above.sort_by_key(|&(order, _)| order);

        self.dispatch(id, Phase::Begin, &geometry, frame);

        self.dispatch(id, Phase::NodesBelow(below.len()), &geometry, frame);
        for &(_, child_id) in &below {
            self.visit_node(child_id, &geometry.world_transform, frame);
        }

        self.dispatch(id, Phase::NodeSelf, &geometry, frame);

        self.dispatch(id, Phase::NodesAbove(above.len()), &geometry, frame);
        for &(_, child_id) in &above {
            self.visit_node(child_id, &geometry.world_transform, frame);
        }

        self.dispatch(id, Phase::End, &geometry, frame);
    }

    fn dispatch(
        &mut self,
        id: usize,
        phase: Phase,
        geometry: &NodeGeometry,
        frame: &mut FrameHandle<'_>,
    ) {
        let node = match self.tree.get_mut(id) {
            Some(node) => node,
            None => return,
        };
        for component in node.components.iter_mut() {
            match phase {
                Phase::Begin => component.handle_visit_begin(geometry, frame),
                Phase::NodesBelow(nodes) => {
                    component.handle_visit_nodes_below(geometry, nodes, frame)
                }
                Phase::NodeSelf => component.handle_visit_self(geometry, frame),
                Phase::NodesAbove(nodes) => {
                    component.handle_visit_nodes_above(geometry, nodes, frame)
                }
                Phase::End => component.handle_visit_end(geometry, frame),
            }
        }
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}
