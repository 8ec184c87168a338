pub mod move_grab;
pub use move_grab::MoveSurfaceGrab;
