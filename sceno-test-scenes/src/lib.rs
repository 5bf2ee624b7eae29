pub mod backend;
pub mod expectations;
pub mod scene;

pub use backend::{test_attachment, RecordingCompiler};
pub use expectations::{check_draw_states, DrawExpectation};
pub use scene::{build_main_scene, CANVAS_HEIGHT, CANVAS_WIDTH};
