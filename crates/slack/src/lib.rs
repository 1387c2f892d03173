//! Slack Integration - HTTP webhook interface
//!
//! This crate provides the Slack side of the change-request bridge:
//! - **Web API client** (`client`) - `views.open`, `chat.postMessage`, `chat.postEphemeral`
//! - **Slash Commands** (`commands`) - form-encoded `/changereq` invocation payload
//! - **Interactivity** (`interactivity`) - `view_submission` payloads and form value extraction
//! - **Block Kit** (`blocks`) - the change-request modal and notification text
//! - **Signatures** (`signature`) - `X-Slack-Signature` request verification
//!
//! # Architecture
//!
//! ```text
//! /changereq ──► SlashCommandPayload ──► SlackApi::open_view(change_request_modal)
//! /slack/interactivity ──► parse_interaction ──► ViewSubmission::extract_form
//!                                                    ↓
//!                          SlackApi::post_message ◄── ledger append
//! ```

pub mod blocks;
pub mod client;
pub mod commands;
pub mod interactivity;
pub mod signature;

pub use client::{SlackApi, SlackApiError, SlackWebClient};
