pub mod comment;
pub mod like;
pub mod pagination;
pub mod playlist;
pub mod serde_ext;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::*;
pub use like::*;
pub use pagination::*;
pub use playlist::*;
pub use subscription::*;
pub use tweet::*;
pub use user::*;
pub use video::*;
