//! User profile mapper

use relay_core::entities::UserProfile;
use relay_core::value_objects::Snowflake;

use crate::models::UserProfileModel;

impl From<UserProfileModel> for UserProfile {
    fn from(model: UserProfileModel) -> Self {
        UserProfile::new(Snowflake::new(model.id), model.name, model.profile_picture)
    }
}
