pub mod events;
pub mod handler;

pub use events::{InputEvent, KeyCode, MouseButton};
pub use handler::{Action, InputHandler};
