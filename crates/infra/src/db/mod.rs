pub mod comments_repo;
pub mod migrations;
pub mod pool;
pub mod posts_repo;

pub use comments_repo::{CommentsRepoError, list_post_comments, replace_post_comments};
pub use migrations::run_migrations;
pub use pool::{DbPool, DbPoolError, connect_lazy};
pub use posts_repo::{PostRecord, PostsRepoError, upsert_post};
