pub mod config;
pub mod controller;
pub mod document;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod paragraphs;
pub mod render;
pub mod session;
pub mod text_map;
pub mod theme;

pub use controller::{Notice, SessionController};
pub use document::DocumentFile;
pub use error::{GatewayError, UploadError};
pub use gateway::{DocumentGateway, HttpGateway};
pub use session::{Effect, Phase, RequestId, Session, SessionEvent, SessionState};
pub use text_map::{TextMap, build_text_map};
