use serde::Deserialize;
use utoipa::ToSchema;

use crate::store::UserPatch;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl From<UpdateProfileRequest> for UserPatch {
    fn from(req: UpdateProfileRequest) -> Self {
        UserPatch {
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            city: req.city,
            postal_code: req.postal_code,
            country: req.country,
        }
    }
}
