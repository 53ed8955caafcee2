//! # Postdeck Server
//!
//! Telegram front end of the Postdeck channel-posting assistant.
//!
//! ## Overview
//!
//! - **Dispatcher**: long-polls the Bot API and hands every private-chat
//!   update to the core state machine
//! - **Messenger**: the core's messaging port over the Bot API
//! - **Membership gate**: optional forced subscription to a channel
//! - **Keepalive**: `GET /` and `GET /health` for hosting platforms
//!
//! ## Configuration
//!
//! Environment variables (a `.env` file is loaded when present): `BOT_TOKEN`,
//! `OWNER_ID` and `LOG_CHANNEL_ID` are required; `DATABASE_URL`,
//! `TMDB_API_KEY`, `FORCE_SUB_CHANNEL`, `INVITE_LINK`, `BLOG_URL`,
//! `CAPTION_FOOTER`, `SERVER_HOST`, `PORT`, `BROADCAST_DELAY_MS` and
//! `MEMBERSHIP_CACHE_SECS` are optional.

pub mod infra;
pub mod telegram;
