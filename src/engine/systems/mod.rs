pub mod cube_grid;
pub mod input_system;
pub mod render_system;

pub use cube_grid::{ build_cube_grid, grid_positions };
pub use input_system::{ apply_cursor_grab, CursorRequest, InputSystem };
pub use render_system::{ FrameStats, RenderSystem };
