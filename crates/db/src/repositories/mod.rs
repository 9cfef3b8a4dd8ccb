//! Repository layer for database operations.

mod comment;
mod like;
mod playlist;
mod subscription;
mod tweet;
mod user;
mod video;
mod watch_history;

pub use comment::CommentRepository;
pub use like::{LikeRepository, LikeTarget};
pub use playlist::PlaylistRepository;
pub use subscription::SubscriptionRepository;
pub use tweet::TweetRepository;
pub use user::UserRepository;
pub use video::{VideoRepository, VideoSort};
pub use watch_history::WatchHistoryRepository;
