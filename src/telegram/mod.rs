//! Telegram Bot API adapter: object model and HTTP client.

mod client;
pub mod types;


pub use client::{TelegramClient, TelegramError, TelegramResult};
pub use types::{
    CallbackQuery, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update, User,
};
