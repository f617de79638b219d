//! Thin request handlers around the title rating table.
//!
//! - [`ratings`]: the static lookup table
//! - [`action_group`]: Bedrock Agent action-group events
//! - [`gateway`]: gateway tools (`get_title_rating`, `get_show_detail`)

pub mod action_group;
pub mod gateway;
pub mod ratings;

pub use action_group::handle_action_group;
pub use gateway::{Gateway, GatewayTool, title_rating};
pub use ratings::{NOT_AVAILABLE, RatingLookup, lookup_rating};
