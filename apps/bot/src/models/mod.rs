pub mod posting;
pub mod profile;

pub use posting::{MatchResult, Posting};
pub use profile::UserProfile;
