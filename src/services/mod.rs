pub mod conversation_service;
pub mod friend_service;
pub mod message_service;
pub mod user_service;
