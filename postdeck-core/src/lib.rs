//! # Postdeck Core
//!
//! Core library for the Postdeck channel-posting assistant: upload
//! conversations, retrieval codes, keyboard layout and persistence.
//!
//! ## Overview
//!
//! - **Conversations**: a per-user state machine driving the posting wizard,
//!   the edit-existing-post flow and the admin side flows
//! - **Metadata extraction**: group key and quality from a file name
//! - **Code registry**: one retrieval code per group of uploads
//! - **Layout compiler**: episodic and standard button grids under the
//!   platform's button ceiling
//! - **Retrieval**: replaying stored files for a code, with timed deletion
//! - **Ports**: trait seams for the messenger, the stores and the external
//!   services, with in-memory, HTTP and PostgreSQL adapters
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL adapters and migrations (SQLx)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Inbound events, button actions and the conversation state machine
pub mod conversation;

/// Error types and their reply classes
pub mod error;

/// Adapters implementing the ports
pub mod infra;

/// Upload groups and the button grid compiler
pub mod layout;

/// Retrieval links and channel post links
pub mod links;

/// Group key and quality extraction from file names
pub mod metadata;

/// Traits for everything outside the core
pub mod ports;

/// Retrieval code minting and file registration
pub mod registry;

/// Code lookup and file delivery
pub mod retrieval;

/// Per-user conversation sessions
pub mod session;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use conversation::{AssistantSettings, Collaborators, Inbound, InboundEvent, StateMachine};
pub use error::{ErrorClass, ExpiredKind, PostError, Result};
pub use layout::{CompiledLayout, GroupLinks, LayoutCompiler};
pub use links::{LinkBuilder, PostLink};
pub use metadata::{DetectionMode, Extraction, GroupKey, MetadataExtractor};
pub use registry::{CodeRegistry, Registration};
pub use retrieval::{RetrievalOutcome, RetrievalService};
pub use session::{Session, SessionStore, WizardState};
