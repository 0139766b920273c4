pub mod editor;

pub use editor::{EditorActor, EditorArguments, EditorMsg};
