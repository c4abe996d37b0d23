//! Language model adapters used by the answering layer.

pub mod gemini_chat;

pub use gemini_chat::GeminiChatModel;
