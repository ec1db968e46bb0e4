use diesel::prelude::*;

use tulia_core::counselors::Counselor;
use tulia_core::errors::Result;

use crate::db::{list_from_db, list_to_db};
use crate::schema::counselors;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = counselors)]
pub struct CounselorDB {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_image_url: String,
    pub specializations: String,
    pub qualifications: String,
    pub bio: String,
    pub years_of_experience: i32,
    pub is_available: bool,
    pub rating: f64,
    pub total_sessions: i32,
    pub office_location: String,
    pub working_hours: String,
    pub consultation_fee: f64,
    pub languages: String,
    pub created_at: i64,
}

impl CounselorDB {
    pub fn from_domain(counselor: Counselor) -> Result<Self> {
        Ok(Self {
            id: counselor.id,
            first_name: counselor.first_name,
            last_name: counselor.last_name,
            email: counselor.email,
            phone_number: counselor.phone_number,
            profile_image_url: counselor.profile_image_url,
            specializations: list_to_db(&counselor.specializations)?,
            qualifications: list_to_db(&counselor.qualifications)?,
            bio: counselor.bio,
            years_of_experience: counselor.years_of_experience,
            is_available: counselor.is_available,
            rating: counselor.rating,
            total_sessions: counselor.total_sessions,
            office_location: counselor.office_location,
            working_hours: counselor.working_hours,
            consultation_fee: counselor.consultation_fee,
            languages: list_to_db(&counselor.languages)?,
            created_at: counselor.created_at,
        })
    }

    pub fn into_domain(self) -> Result<Counselor> {
        Ok(Counselor {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            profile_image_url: self.profile_image_url,
            specializations: list_from_db(&self.specializations)?,
            qualifications: list_from_db(&self.qualifications)?,
            bio: self.bio,
            years_of_experience: self.years_of_experience,
            is_available: self.is_available,
            rating: self.rating,
            total_sessions: self.total_sessions,
            office_location: self.office_location,
            working_hours: self.working_hours,
            consultation_fee: self.consultation_fee,
            languages: list_from_db(&self.languages)?,
            created_at: self.created_at,
        })
    }
}
