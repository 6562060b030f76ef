//! Domain entities - the core business objects.

mod comment;
mod post;
mod taxonomy;
mod user;

pub use comment::{COMMENT_MAX_CHARS, Comment, CommentRecord};
pub use post::{Post, PostDraft, PostRecord};
pub use taxonomy::{Category, Location};
pub use user::{ProfileUpdate, User, UserSummary};
