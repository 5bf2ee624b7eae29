use sceno::lyon::math::Size;
use sceno::{
    Node, Padding, PipelineParams, SceneTree, Sprite, StateApplyMode, StateScope, URect,
};

use crate::expectations::DrawExpectation;

// ── Grid layout constants ────────────────────────────────────────────────────

const TILE_SIZE: u32 = 100;
const COLUMNS: u32 = 4;
const ROWS: u32 = 3;

pub const CANVAS_WIDTH: u32 = TILE_SIZE * COLUMNS;
pub const CANVAS_HEIGHT: u32 = TILE_SIZE * ROWS;

/// Returns the origin (bottom-left corner) of tile number `n` (1-based).
fn tile_origin(tile_number: u32) -> (f32, f32) {
    let index = tile_number - 1;
    let column = index % COLUMNS;
    let row = index / COLUMNS;
    ((column * TILE_SIZE) as f32, (row * TILE_SIZE) as f32)
}

fn solid_sprite() -> Sprite {
    Sprite::new(Vec::new(), PipelineParams::default())
}

fn blended_sprite() -> Sprite {
    Sprite::new(
        Vec::new(),
        PipelineParams::default().with_blend(sceno::wgpu::BlendState::ALPHA_BLENDING),
    )
}

fn all_phase_scissor_scope() -> StateScope {
    let mut scope = StateScope::new(StateApplyMode::ALL);
    scope.enable_scissor(Padding::ZERO);
    scope
}

/// Builds the entire main test scene into the given tree and returns one
/// expectation per draw the traversal must record, in draw order.
///
/// This function is shared between the integration tests (which validate
/// the recorded state of every draw) and the traversal benchmark.
pub fn build_main_scene(scene: &mut SceneTree) -> Vec<DrawExpectation> {
    let mut expectations: Vec<DrawExpectation> = Vec::new();

    // All tiles hang off a single full-canvas root so sibling tiles never
    // scope each other.
    let root = scene.add_root(
        Node::new().with_content_size(Size::new(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)),
    );

    expectations.extend(tile_01_unclipped_sprite(scene, root));
    expectations.extend(tile_02_scoped_sprite(scene, root));
    expectations.extend(tile_03_nested_scopes(scene, root));
    expectations.extend(tile_04_disjoint_child_scope(scene, root));
    expectations.extend(tile_05_below_above_scope(scene, root));
    expectations.extend(tile_06_sibling_scopes(scene, root));
    expectations.extend(tile_07_ignore_parent(scene, root));
    expectations.extend(tile_08_viewport_scope(scene, root));
    expectations.extend(tile_09_outline_expanded_scissor(scene, root));
    expectations.extend(tile_10_invisible_subtree(scene, root));

    expectations
}

// ── Section A: Baseline draws ────────────────────────────────────────────────

fn tile_01_unclipped_sprite(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(1);
    scene.add_child(
        root,
        Node::new()
            .with_position(ox + 10.0, oy + 10.0)
            .with_content_size(Size::new(30.0, 30.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::unclipped("t01_unclipped")]
}

fn tile_02_scoped_sprite(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(2);
    let scope_node = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 10.0, oy + 10.0)
            .with_content_size(Size::new(80.0, 80.0))
            .with_component(all_phase_scissor_scope()),
    );
    scene.add_child(
        scope_node,
        Node::new()
            .with_position(5.0, 5.0)
            .with_content_size(Size::new(20.0, 20.0))
            .with_component(blended_sprite()),
    );

    vec![DrawExpectation::clipped(
        URect::new(ox as u32 + 10, oy as u32 + 10, 80, 80),
        "t02_scoped",
    )]
}

// ── Section B: Scope nesting ─────────────────────────────────────────────────

fn tile_03_nested_scopes(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(3);
    let outer = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 5.0, oy + 5.0)
            .with_content_size(Size::new(80.0, 80.0))
            .with_component(all_phase_scissor_scope()),
    );
    // Overflows the outer scope right and up; the effective clip is the
    // intersection of both rects.
    let inner = scene.add_child(
        outer,
        Node::new()
            .with_position(40.0, 40.0)
            .with_content_size(Size::new(80.0, 80.0))
            .with_component(all_phase_scissor_scope()),
    );
    scene.add_child(
        inner,
        Node::new()
            .with_position(5.0, 5.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::clipped(
        URect::new(ox as u32 + 45, oy as u32 + 45, 40, 40),
        "t03_nested_intersection",
    )]
}

fn tile_04_disjoint_child_scope(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(4);
    let outer = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 5.0, oy + 5.0)
            .with_content_size(Size::new(50.0, 50.0))
            .with_component(all_phase_scissor_scope()),
    );
    // The child scope's rect lies entirely outside the outer clip. The
    // outer scissor stays in effect rather than collapsing to an empty
    // rect.
    let inner = scene.add_child(
        outer,
        Node::new()
            .with_position(60.0, 0.0)
            .with_content_size(Size::new(20.0, 20.0))
            .with_component(all_phase_scissor_scope()),
    );
    scene.add_child(
        inner,
        Node::new()
            .with_position(2.0, 2.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::clipped(
        URect::new(ox as u32 + 5, oy as u32 + 5, 50, 50),
        "t04_disjoint_keeps_outer",
    )]
}

// ── Section C: Phase coverage ────────────────────────────────────────────────

fn tile_05_below_above_scope(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(5);
    let mut scope = StateScope::new(StateApplyMode::NODES_BELOW | StateApplyMode::NODES_ABOVE);
    scope.enable_scissor(Padding::ZERO);

    // The scope covers children on both sides but not the node's own
    // draw: it closes before the self phase and reopens after it.
    let holder = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 10.0, oy + 10.0)
            .with_content_size(Size::new(60.0, 60.0))
            .with_component(scope)
            .with_component(solid_sprite()),
    );
    scene.add_child(
        holder,
        Node::new()
            .with_order(-1)
            .with_position(5.0, 5.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );
    scene.add_child(
        holder,
        Node::new()
            .with_order(1)
            .with_position(30.0, 30.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    let clip = URect::new(ox as u32 + 10, oy as u32 + 10, 60, 60);
    vec![
        DrawExpectation::clipped(clip, "t05_below_clipped"),
        DrawExpectation::unclipped("t05_self_unclipped"),
        DrawExpectation::clipped(clip, "t05_above_clipped"),
    ]
}

fn tile_06_sibling_scopes(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(6);
    for offset in [10.0f32, 60.0] {
        scene.add_child(
            root,
            Node::new()
                .with_position(ox + offset, oy + 10.0)
                .with_content_size(Size::new(40.0, 40.0))
                .with_component(all_phase_scissor_scope())
                .with_component(solid_sprite()),
        );
    }

    vec![
        DrawExpectation::clipped(URect::new(ox as u32 + 10, oy as u32 + 10, 40, 40), "t06_first_sibling"),
        DrawExpectation::clipped(URect::new(ox as u32 + 60, oy as u32 + 10, 40, 40), "t06_second_sibling"),
    ]
}

// ── Section D: Modifier variants ─────────────────────────────────────────────

fn tile_07_ignore_parent(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(7);
    let outer = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 5.0, oy + 5.0)
            .with_content_size(Size::new(80.0, 80.0))
            .with_component(all_phase_scissor_scope()),
    );
    let mut detached = all_phase_scissor_scope();
    detached.set_ignore_parent_state(true);
    let inner = scene.add_child(
        outer,
        Node::new()
            .with_position(10.0, 10.0)
            .with_content_size(Size::new(100.0, 100.0))
            .with_component(detached),
    );
    scene.add_child(
        inner,
        Node::new()
            .with_position(5.0, 5.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    // The inner rect overflows the outer clip; ignoring the parent keeps
    // it whole instead of intersecting.
    vec![DrawExpectation::clipped(
        URect::new(ox as u32 + 15, oy as u32 + 15, 100, 100),
        "t07_ignore_parent",
    )]
}

fn tile_08_viewport_scope(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(8);
    let viewport = URect::new(ox as u32, oy as u32, TILE_SIZE, TILE_SIZE);
    let mut scope = StateScope::new(StateApplyMode::ALL);
    scope.set_viewport(Some(viewport));

    let holder = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 10.0, oy + 10.0)
            .with_component(scope),
    );
    scene.add_child(
        holder,
        Node::new()
            .with_position(5.0, 5.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::unclipped("t08_viewport").with_viewport(viewport)]
}

fn tile_09_outline_expanded_scissor(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(9);
    let mut scope = StateScope::new(StateApplyMode::ALL);
    scope.enable_scissor(Padding::all(8.0));

    let holder = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 20.0, oy + 20.0)
            .with_content_size(Size::new(40.0, 40.0))
            .with_component(scope),
    );
    scene.add_child(
        holder,
        Node::new()
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::clipped(
        URect::new(ox as u32 + 12, oy as u32 + 12, 56, 56),
        "t09_outline",
    )]
}

// ── Section E: Visibility ────────────────────────────────────────────────────

fn tile_10_invisible_subtree(scene: &mut SceneTree, root: usize) -> Vec<DrawExpectation> {
    let (ox, oy) = tile_origin(10);
    let hidden = scene.add_child(
        root,
        Node::new()
            .with_position(ox + 10.0, oy + 10.0)
            .with_content_size(Size::new(30.0, 30.0))
            .with_visible(false)
            .with_component(solid_sprite()),
    );
    scene.add_child(
        hidden,
        Node::new()
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );
    // The invisible subtree above must contribute nothing; this marker is
    // the tile's only draw.
    scene.add_child(
        root,
        Node::new()
            .with_position(ox + 50.0, oy + 50.0)
            .with_content_size(Size::new(10.0, 10.0))
            .with_component(solid_sprite()),
    );

    vec![DrawExpectation::unclipped("t10_after_invisible")]
}
