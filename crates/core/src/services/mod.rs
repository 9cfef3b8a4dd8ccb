//! Business logic services.

pub mod account;
pub mod comment;
pub mod dashboard;
pub mod like;
pub mod mail;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod video;

pub use account::{
    AccountService, AuthTokens, ChannelProfile, RegisterInput, UpdateDetailsInput, UserSummary,
    UserView, WatchHistoryVideo,
};
pub use comment::{AddCommentInput, CommentService, CommentView};
pub use dashboard::{ChannelStats, DashboardService};
pub use like::{LikeService, ToggleResult};
pub use mail::MailService;
pub use playlist::{PlaylistInput, PlaylistService, PlaylistView, PlaylistWithVideos};
pub use subscription::SubscriptionService;
pub use tweet::{TweetService, TweetView};
pub use video::{ListVideosParams, VideoDetail, VideoPage, VideoService, VideoView};
