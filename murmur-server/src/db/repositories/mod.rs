mod user_repository;
mod post_repository;
mod comment_repository;
mod follow_repository;
mod like_repository;
mod feed_repository;
mod search_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use comment_repository::CommentRepository;
pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use feed_repository::{FeedRepository, FEED_PAGE_SIZE};
pub use search_repository::{SearchRepository, POST_SEARCH_LIMIT, USER_SEARCH_LIMIT};
