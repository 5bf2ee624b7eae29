use crate::draw_state::{StackEntry, StateModifier};
use crate::frame::FrameHandle;
use crate::id::{ScopeOwnerId, StateId};
use crate::node::{NodeGeometry, SceneComponent};
use crate::rect::{Padding, URect};
use bitflags::bitflags;
use lyon::math::Point;

bitflags! {
    /// Which visit phases of the owning node a state scope covers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateApplyMode: u32 {
        /// Children drawn below the node.
        const NODES_BELOW = 1 << 0;
        /// The node's own draw.
        const NODE_SELF = 1 << 1;
        /// Children drawn above the node.
        const NODES_ABOVE = 1 << 2;
        const ALL = Self::NODES_BELOW.bits() | Self::NODE_SELF.bits() | Self::NODES_ABOVE.bits();
    }
}

/// Scene component that scopes dynamic draw state (scissor, viewport) over
/// part of the node tree.
///
/// During traversal the scope opens a state entry for the phases selected
/// by its [`StateApplyMode`] and closes it afterwards. The effective state
/// is the scope's own contribution applied on top of whatever outer scopes
/// contributed; the computed value is cached per visitation and re-pushed
/// without recomputation when the scope reopens around its own draw.
pub struct StateScope {
    owner: ScopeOwnerId,
    apply: StateApplyMode,
    scissor_enabled: bool,
    scissor_outline: Padding,
    viewport: Option<URect>,
    ignore_parent_state: bool,
    modifier: StateModifier,
    current_state_id: StateId,
    state_active: bool,
    state_pushed: bool,
    state_values_actual: bool,
}

impl StateScope {
    pub fn new(apply: StateApplyMode) -> Self {
        Self {
            owner: ScopeOwnerId::next(),
            apply,
            scissor_enabled: false,
            scissor_outline: Padding::ZERO,
            viewport: None,
            ignore_parent_state: false,
            modifier: StateModifier::default(),
            current_state_id: StateId::NONE,
            state_active: false,
            state_pushed: false,
            state_values_actual: false,
        }
    }

    pub fn owner(&self) -> ScopeOwnerId {
        self.owner
    }

    pub fn apply_mode(&self) -> StateApplyMode {
        self.apply
    }

    pub fn set_state_apply_mode(&mut self, apply: StateApplyMode) {
        if self.apply != apply {
            self.apply = apply;
            self.state_values_actual = false;
        }
    }

    /// Clips everything inside the scope to the owning node's content
    /// rectangle, expanded by `outline` on each edge.
    pub fn enable_scissor(&mut self, outline: Padding) {
        self.scissor_enabled = true;
        self.scissor_outline = outline;
        self.state_values_actual = false;
    }

    pub fn disable_scissor(&mut self) {
        if self.scissor_enabled {
            self.scissor_enabled = false;
            self.state_values_actual = false;
        }
    }

    pub fn is_scissor_enabled(&self) -> bool {
        self.scissor_enabled
    }

    pub fn set_viewport(&mut self, viewport: Option<URect>) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.state_values_actual = false;
        }
    }

    /// When set, outer scopes contribute nothing to this scope's state.
    pub fn set_ignore_parent_state(&mut self, ignore: bool) {
        if self.ignore_parent_state != ignore {
            self.ignore_parent_state = ignore;
            self.state_values_actual = false;
        }
    }

    /// Id of the state computed by the last rebuild. Frame-local.
    pub fn current_state_id(&self) -> StateId {
        self.current_state_id
    }

    /// Opens the scope's state entry on the frame stack.
    ///
    /// Idempotent while the scope is active. When the computed state equals
    /// the one already on top of the stack (the scope contributes nothing
    /// new), no entry is pushed and no dynamic state would be re-issued;
    /// the scope merely marks itself active.
    pub fn push_state(&mut self, node: &NodeGeometry, frame: &mut FrameHandle<'_>) {
        if self.state_active {
            return;
        }
        let prev = frame.current_state_id();
        if !self.state_values_actual {
            self.rebuild_state(node, frame);
        }
        if self.current_state_id == prev {
            self.state_active = true;
            return;
        }
        frame.push_state_scope(StackEntry {
            state: self.current_state_id,
            owner: self.owner,
            modifier: Some(self.modifier),
        });
        self.state_active = true;
        self.state_pushed = true;
    }

    /// Closes the scope's state entry, repairing the stack when sibling
    /// scopes closed out of order.
    pub fn pop_state(&mut self, frame: &mut FrameHandle<'_>) {
        if !self.state_active {
            return;
        }
        if self.state_pushed {
            frame.pop_state_scope(self.owner);
        }
        self.state_active = false;
        self.state_pushed = false;
    }

    /// Recomputes the scope's modifier from the node geometry, resolves it
    /// against the current stack top and caches the resulting state id.
    pub fn rebuild_state(&mut self, node: &NodeGeometry, frame: &mut FrameHandle<'_>) -> StateId {
        self.modifier = StateModifier {
            ignore_parent: self.ignore_parent_state,
            viewport: self.viewport,
            scissor: self.scissor_enabled.then(|| self.world_scissor_rect(node)),
        };
        self.current_state_id = frame.resolve_modifier(&self.modifier);
        self.state_values_actual = true;
        self.current_state_id
    }

    /// Node content rectangle expanded by the outline, mapped to
    /// world-space pixels.
    ///
    /// Both corners go through the node's world transform; the axes are
    /// normalized afterwards so a flipping transform still yields a
    /// positive extent. Coordinates round to the nearest pixel and clamp
    /// at zero.
    fn world_scissor_rect(&self, node: &NodeGeometry) -> URect {
        let outline = &self.scissor_outline;
        let low = node.to_world(Point::new(-outline.left, -outline.bottom));
        let high = node.to_world(Point::new(
            node.content_size.width + outline.right,
            node.content_size.height + outline.top,
        ));
        let x = low.x.min(high.x).round() as u32;
        let y = low.y.min(high.y).round() as u32;
        let right = low.x.max(high.x).round() as u32;
        let top = low.y.max(high.y).round() as u32;
        URect::new(x, y, right.saturating_sub(x), top.saturating_sub(y))
    }
}

impl SceneComponent for StateScope {
    fn handle_visit_begin(&mut self, _node: &NodeGeometry, _frame: &mut FrameHandle<'_>) {
        self.state_values_actual = false;
    }

    fn handle_visit_nodes_below(
        &mut self,
        node: &NodeGeometry,
        nodes: usize,
        frame: &mut FrameHandle<'_>,
    ) {
        if nodes > 0 && self.apply.intersects(StateApplyMode::NODES_BELOW) {
            self.push_state(node, frame);
        }
    }

    fn handle_visit_self(&mut self, node: &NodeGeometry, frame: &mut FrameHandle<'_>) {
        if self.apply.intersects(StateApplyMode::NODE_SELF) {
            self.push_state(node, frame);
        } else {
            self.pop_state(frame);
        }
    }

    fn handle_visit_nodes_above(
        &mut self,
        node: &NodeGeometry,
        nodes: usize,
        frame: &mut FrameHandle<'_>,
    ) {
        if nodes > 0 && self.apply.intersects(StateApplyMode::NODES_ABOVE) {
            self.push_state(node, frame);
        } else {
            self.pop_state(frame);
        }
    }

    fn handle_visit_end(&mut self, _node: &NodeGeometry, frame: &mut FrameHandle<'_>) {
        self.pop_state(frame);
        self.state_values_actual = false;
    }
}
