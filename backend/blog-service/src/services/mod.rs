/// Business logic layer
pub mod accounts;
pub mod comments;
pub mod posts;

pub use accounts::{generate_api_key, AccountService, NotificationService};
pub use comments::{CommentService, Rejection, Submission};
pub use posts::{post_detail, CommentFormState, CommentView, PostDetail, PostService};
