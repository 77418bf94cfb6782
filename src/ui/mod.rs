//! Formateo de mensajes y teclados para el chat

pub mod messages;
