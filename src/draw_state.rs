use bitflags::bitflags;
use smallvec::SmallVec;

use crate::id::{ScopeOwnerId, StateId};
use crate::rect::URect;

/// Expected depth of out-of-order scope closes before the repair buffer
/// spills to the heap.
const STACK_REPAIR_CAPACITY: usize = 8;

bitflags! {
    /// Which dynamic values a draw state carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DrawStateFlags: u32 {
        const SCISSOR = 1 << 0;
        const VIEWPORT = 1 << 1;
    }
}

/// The dynamic GPU state a draw command is issued under.
///
/// Rect fields are meaningful only when the matching flag is set. A state
/// with empty flags is the null state and is never registered in a table;
/// [`StateId::NONE`] stands for it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawState {
    pub flags: DrawStateFlags,
    pub viewport: URect,
    pub scissor: URect,
}

impl DrawState {
    pub fn scissor_enabled(&self) -> bool {
        self.flags.contains(DrawStateFlags::SCISSOR)
    }

    pub fn viewport_enabled(&self) -> bool {
        self.flags.contains(DrawStateFlags::VIEWPORT)
    }
}

/// What one scope contributes to the states below it, captured as plain
/// values so an entry can be recomputed without reaching back into the
/// scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateModifier {
    pub ignore_parent: bool,
    pub viewport: Option<URect>,
    pub scissor: Option<URect>,
}

impl StateModifier {
    /// Applies this scope's contribution on top of an inherited state.
    ///
    /// The viewport is replaced outright when set, so the innermost enabler
    /// wins. The scissor is installed when the inherited state has none and
    /// intersected when the rects overlap. A scope disjoint from the
    /// inherited scissor keeps the inherited rect unchanged; clips never
    /// collapse to an empty region, the ancestor's clip keeps winning.
    pub fn apply(&self, inherited: &DrawState) -> DrawState {
        let mut ret = if self.ignore_parent { DrawState::default() } else { *inherited };
        if let Some(viewport) = self.viewport {
            ret.flags |= DrawStateFlags::VIEWPORT;
            ret.viewport = viewport;
        }
        if let Some(scissor) = self.scissor {
            if !ret.scissor_enabled() {
                ret.flags |= DrawStateFlags::SCISSOR;
                ret.scissor = scissor;
            } else if let Some(overlap) = ret.scissor.intersection(&scissor) {
                ret.scissor = overlap;
            }
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        !self.ignore_parent && self.viewport.is_none() && self.scissor.is_none()
    }
}

/// Frame-local value-dedup table of draw states.
///
/// Ids are indices into the table and are only meaningful within the frame
/// that produced them. Tables stay small, so registration is a linear scan.
#[derive(Debug, Default)]
pub struct StateTable {
    states: Vec<DrawState>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of an equal registered state, registering the value
    /// first if it is new.
    pub fn register(&mut self, values: DrawState) -> StateId {
        if let Some(idx) = self.states.iter().position(|state| *state == values) {
            return StateId(idx as u32);
        }
        let idx = self.states.len() as u32;
        debug_assert!(idx != u32::MAX);
        self.states.push(values);
        StateId(idx)
    }

    pub fn get(&self, id: StateId) -> Option<&DrawState> {
        self.states.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// One open scope on the state stack.
///
/// `modifier` is `None` for ownerless entries pushed directly (pass-level
/// overrides); those are restored verbatim when the stack is repaired.
#[derive(Debug, Clone, Copy)]
pub struct StackEntry {
    pub state: StateId,
    pub owner: ScopeOwnerId,
    pub modifier: Option<StateModifier>,
}

/// The stack of currently open state scopes for one frame.
#[derive(Debug, Default)]
pub struct StateStack {
    entries: Vec<StackEntry>,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the innermost open scope, [`StateId::NONE`] when no scope is
    /// open.
    pub fn current(&self) -> StateId {
        self.entries.last().map(|entry| entry.state).unwrap_or(StateId::NONE)
    }

    /// Values of the innermost open scope, the default state when none.
    pub fn current_values(&self, table: &StateTable) -> DrawState {
        table.get(self.current()).copied().unwrap_or_default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[StackEntry] {
        &self.entries
    }
}

/// Applies a modifier against the stack's current state and registers the
/// result, returning [`StateId::NONE`] for the null state.
pub(crate) fn resolve_modifier(
    table: &mut StateTable,
    stack: &StateStack,
    modifier: &StateModifier,
) -> StateId {
    let inherited = stack.current_values(table);
    let next = modifier.apply(&inherited);
    if next.flags.is_empty() {
        StateId::NONE
    } else {
        table.register(next)
    }
}

/// Closes the scope owned by `owner`, repairing the stack when the entry is
/// not on top.
///
/// Entries above the closed one are buffered off, then re-pushed in their
/// original order with their states recomputed against the new stack top.
/// Ownerless entries are re-pushed verbatim. Returns `false` when no entry
/// belongs to `owner`, which is a caller bug; the stack is left as it was.
pub(crate) fn pop_scope(table: &mut StateTable, stack: &mut StateStack, owner: ScopeOwnerId) -> bool {
    match stack.entries.last() {
        Some(entry) if entry.owner == owner => {
            stack.entries.pop();
            return true;
        }
        None => {
            debug_assert!(false, "state stack empty while closing scope {}", owner);
            return false;
        }
        _ => {}
    }

    let mut buffered: SmallVec<[StackEntry; STACK_REPAIR_CAPACITY]> = SmallVec::new();
    let mut found = false;
    while let Some(top) = stack.entries.pop() {
        if top.owner == owner {
            found = true;
            break;
        }
        buffered.push(top);
    }

    if !found {
        debug_assert!(false, "no open state entry for scope {}", owner);
        while let Some(entry) = buffered.pop() {
            stack.entries.push(entry);
        }
        return false;
    }

    while let Some(mut entry) = buffered.pop() {
        if let Some(modifier) = entry.modifier {
            entry.state = resolve_modifier(table, stack, &modifier);
        }
        stack.entries.push(entry);
    }
    true
}
