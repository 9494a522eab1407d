pub mod color;
pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod geometry;
pub mod knowledge;
pub mod preference;
pub mod responder;
pub mod session;

// Re-export main types for convenience
pub use color::{ColorValue, Foreground};
pub use command::Command;
pub use config::Config;
pub use conversation::{ConversationStore, Message, Sender};
pub use error::{FolioError, ResponseError};
pub use geometry::{GeometryController, PhaseKind, Pointer, Viewport, WindowGeometry};
pub use knowledge::{KnowledgeBase, KnowledgeEntry};
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, UserPreference};
pub use responder::{Responder, ResponseEngine};
pub use session::{ChatSession, SubmitOutcome};
