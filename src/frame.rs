use crate::batch::{DependencyToken, MaterialCompiler};
use crate::draw_state::{
    pop_scope, resolve_modifier, DrawState, StackEntry, StateModifier, StateStack, StateTable,
};
use crate::id::{MaterialId, ScopeOwnerId, StateId, TextureId};
use crate::material::{MaterialDescriptor, MaterialImage};
use crate::registry::MaterialRegistry;

/// One recorded draw: which material it samples and which dynamic state it
/// must be issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOp {
    pub material: MaterialId,
    pub state: StateId,
}

/// What a finished frame hands back to the caller: the recorded draw list
/// and the dependency tokens it must wait on before executing draws that
/// reference freshly acquired materials.
#[derive(Debug, Default)]
pub struct FrameSubmission {
    pub draw_ops: Vec<DrawOp>,
    pub wait_dependencies: Vec<DependencyToken>,
}

/// Per-frame binding of the state table, the scope stack, the draw list,
/// and the scene's material registry.
///
/// A handle exclusively borrows the registry for the frame's lifetime;
/// state ids it produces are meaningless outside that frame. Traversal
/// records draws and opens/closes state scopes through the handle, then
/// [`FrameHandle::finish`] flushes the registry's pending material work
/// once and returns the submission.
pub struct FrameHandle<'a> {
    registry: &'a mut MaterialRegistry,
    states: StateTable,
    stack: StateStack,
    commands: Vec<DrawOp>,
    wait_dependencies: Vec<DependencyToken>,
}

impl<'a> FrameHandle<'a> {
    pub(crate) fn new(registry: &'a mut MaterialRegistry) -> Self {
        Self {
            registry,
            states: StateTable::new(),
            stack: StateStack::new(),
            commands: Vec::new(),
            wait_dependencies: Vec::new(),
        }
    }

    /// Id of the innermost open state scope, [`StateId::NONE`] when none.
    pub fn current_state_id(&self) -> StateId {
        self.stack.current()
    }

    /// Values behind a state id. [`StateId::NONE`] resolves to nothing.
    pub fn state(&self, id: StateId) -> Option<&DrawState> {
        self.states.get(id)
    }

    /// Registers a state value in the frame table, deduplicating equal
    /// values.
    pub fn register_state(&mut self, values: DrawState) -> StateId {
        self.states.register(values)
    }

    /// Applies a modifier on top of the current state and registers the
    /// result. The null result (empty flags) yields [`StateId::NONE`].
    pub fn resolve_modifier(&mut self, modifier: &StateModifier) -> StateId {
        resolve_modifier(&mut self.states, &self.stack, modifier)
    }

    /// Opens a scope owned by a state component.
    pub fn push_state_scope(&mut self, entry: StackEntry) {
        self.stack.push(entry);
    }

    /// Opens an ownerless scope with a fixed state id. Used for pass-level
    /// overrides; the entry is restored verbatim if the stack is repaired
    /// around it.
    pub fn push_raw_state(&mut self, state: StateId) {
        self.stack.push(StackEntry { state, owner: ScopeOwnerId::ORPHAN, modifier: None });
    }

    /// Closes the scope owned by `owner`, repairing the stack when the
    /// entry is not on top.
    pub fn pop_state_scope(&mut self, owner: ScopeOwnerId) -> bool {
        pop_scope(&mut self.states, &mut self.stack, owner)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// See [`MaterialRegistry::get_material`].
    pub fn get_material(&self, descriptor: &MaterialDescriptor) -> MaterialId {
        self.registry.get_material(descriptor)
    }

    /// See [`MaterialRegistry::acquire_material`].
    pub fn acquire_material(
        &mut self,
        descriptor: &MaterialDescriptor,
        images: Vec<MaterialImage>,
        owner_data: Option<Vec<u8>>,
        revokable: bool,
    ) -> MaterialId {
        self.registry.acquire_material(descriptor, images, owner_data, revokable)
    }

    /// See [`MaterialRegistry::revoke_images`].
    pub fn revoke_images(&mut self, images: &[TextureId]) {
        self.registry.revoke_images(images)
    }

    pub fn push_draw(&mut self, op: DrawOp) {
        self.commands.push(op);
    }

    pub fn draw_ops(&self) -> &[DrawOp] {
        &self.commands
    }

    /// Adds an externally produced token the frame must wait on.
    pub fn add_wait_dependency(&mut self, token: DependencyToken) {
        self.wait_dependencies.push(token);
    }

    /// Ends the frame: flushes the registry's pending material batch and
    /// returns the draw list together with every token to wait on.
    ///
    /// All state scopes must be closed by now; an unbalanced stack is a
    /// traversal bug.
    pub fn finish(mut self, compiler: &dyn MaterialCompiler) -> FrameSubmission {
        debug_assert!(
            self.stack.is_empty(),
            "state stack unbalanced at frame end: {} open scopes",
            self.stack.depth()
        );
        if let Some(token) = self.registry.flush(compiler) {
            self.wait_dependencies.push(token);
        }
        FrameSubmission {
            draw_ops: self.commands,
            wait_dependencies: self.wait_dependencies,
        }
    }
}
