//! # services
//!
//! Application services for the community board: they translate request
//! payloads into calls on the domain ports and enforce ownership rules.

pub mod board;
pub mod comment;
pub mod dto;
pub mod pagination;

pub use board::BoardService;
pub use comment::CommentService;
pub use dto::*;
pub use pagination::PageLimits;
