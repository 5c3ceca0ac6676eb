pub mod editor;
pub mod event;
pub mod flow;
pub mod level;
pub mod movement;
pub mod step;
pub mod world;
