use crate::frame::FrameHandle;
use lyon::math::{Point, Size, Transform};

/// Per-node values resolved during traversal, read by the components
/// attached to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    /// Content rectangle extent in node-local units.
    pub content_size: Size,
    /// Node-local to world-space transform, parent transforms included.
    pub world_transform: Transform,
}

impl NodeGeometry {
    pub fn to_world(&self, point: Point) -> Point {
        self.world_transform.transform_point(point)
    }
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            content_size: Size::zero(),
            world_transform: Transform::identity(),
        }
    }
}

/// Visit-phase callbacks delivered to every component of a node while the
/// scene tree is walked.
///
/// Phases arrive in a fixed order per visitation: `begin`, `nodes_below`
/// (only when children draw below the node), `self`, `nodes_above` (only
/// when children draw above), `end`. All handlers default to no-ops so a
/// component implements only the phases it cares about.
pub trait SceneComponent {
    fn handle_visit_begin(&mut self, _node: &NodeGeometry, _frame: &mut FrameHandle<'_>) {}

    /// `nodes` is the number of children about to be visited below.
    fn handle_visit_nodes_below(
        &mut self,
        _node: &NodeGeometry,
        _nodes: usize,
        _frame: &mut FrameHandle<'_>,
    ) {
    }

    fn handle_visit_self(&mut self, _node: &NodeGeometry, _frame: &mut FrameHandle<'_>) {}

    /// `nodes` is the number of children about to be visited above.
    fn handle_visit_nodes_above(
        &mut self,
        _node: &NodeGeometry,
        _nodes: usize,
        _frame: &mut FrameHandle<'_>,
    ) {
    }

    fn handle_visit_end(&mut self, _node: &NodeGeometry, _frame: &mut FrameHandle<'_>) {}
}

/// One node of the scene tree: a local transform, a content rectangle,
/// draw ordering relative to siblings, and the components that react to
/// its traversal.
pub struct Node {
    pub local_transform: Transform,
    pub content_size: Size,
    /// Children with negative order draw below their parent, the rest
    /// above.
    pub order: i32,
    pub visible: bool,
    pub(crate) components: Vec<Box<dyn SceneComponent>>,
    pub(crate) geometry: NodeGeometry,
}

impl Node {
    pub fn new() -> Self {
        Self {
            local_transform: Transform::identity(),
            content_size: Size::zero(),
            order: 0,
            visible: true,
            components: Vec::new(),
            geometry: NodeGeometry::default(),
        }
    }

    pub fn with_content_size(mut self, size: Size) -> Self {
        self.content_size = size;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.local_transform = transform;
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.local_transform = Transform::translation(x, y);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_component(mut self, component: impl SceneComponent + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    pub fn add_component(&mut self, component: impl SceneComponent + 'static) {
        self.components.push(Box::new(component));
    }

    /// Geometry resolved by the most recent traversal.
    pub fn geometry(&self) -> &NodeGeometry {
        &self.geometry
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
