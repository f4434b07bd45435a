//! Scenario bodies shared by the per-backend test targets. Each takes a
//! freshly wired [`Harness`](crate::Harness) with no members or boards.

pub mod board_feed;
pub mod board_service;
pub mod comment_service;
