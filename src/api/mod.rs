//! Client side of the activity REST service.

pub mod http;
pub mod types;

use crate::errors::Result;

pub use http::HttpApiClient;
pub use types::{
    ActivitiesPayload, Activity, AuthResponse, Created, CurrentUser, DateScore, ExportFile,
    MilestoneInsights, NewActivity, Stats,
};

/// Milestone day counts the server accepts.
pub const MILESTONE_DAYS: [u32; 5] = [10, 25, 45, 70, 100];

/// Calls made against `/api/*`. Every call is attempted once; failures come
/// back as [`ChecklistError::Network`](crate::errors::ChecklistError::Network)
/// or [`ChecklistError::Api`](crate::errors::ChecklistError::Api).
pub trait ActivityApi {
    fn current_user(&self) -> Result<CurrentUser>;

    fn stats(&self) -> Result<Stats>;

    /// All entries of the current user, newest date first.
    fn activities(&self) -> Result<Vec<Activity>>;

    /// Stores an entry and returns its id when the server reports one.
    fn create_activity(&self, activity: &NewActivity) -> Result<Option<i64>>;

    fn delete_activity(&self, id: i64) -> Result<()>;

    fn milestone(&self, days: u32) -> Result<MilestoneInsights>;

    fn export_excel(&self) -> Result<ExportFile>;
}

impl<T: ActivityApi + ?Sized> ActivityApi for &T {
    fn current_user(&self) -> Result<CurrentUser> {
        (**self).current_user()
    }

    fn stats(&self) -> Result<Stats> {
        (**self).stats()
    }

    fn activities(&self) -> Result<Vec<Activity>> {
        (**self).activities()
    }

    fn create_activity(&self, activity: &NewActivity) -> Result<Option<i64>> {
        (**self).create_activity(activity)
    }

    fn delete_activity(&self, id: i64) -> Result<()> {
        (**self).delete_activity(id)
    }

    fn milestone(&self, days: u32) -> Result<MilestoneInsights> {
        (**self).milestone(days)
    }

    fn export_excel(&self) -> Result<ExportFile> {
        (**self).export_excel()
    }
}
