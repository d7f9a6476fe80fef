pub mod engagement;
pub use engagement::{EngagementError, EngagementService};

pub mod invites;
pub use invites::{InviteError, InviteService};

pub mod notifications;
pub use notifications::{NotificationError, NotificationService};
