use diesel::prelude::*;

use tulia_core::users::User;

use crate::schema::users;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserDB {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    pub phone_number: String,
    pub course: String,
    pub year_of_study: i32,
    pub profile_image_url: String,
    pub is_verified: bool,
    pub created_at: i64,
    pub last_active: i64,
}

impl From<User> for UserDB {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            student_id: user.student_id,
            phone_number: user.phone_number,
            course: user.course,
            year_of_study: user.year_of_study,
            profile_image_url: user.profile_image_url,
            is_verified: user.is_verified,
            created_at: user.created_at,
            last_active: user.last_active,
        }
    }
}

impl From<UserDB> for User {
    fn from(row: UserDB) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            student_id: row.student_id,
            phone_number: row.phone_number,
            course: row.course,
            year_of_study: row.year_of_study,
            profile_image_url: row.profile_image_url,
            is_verified: row.is_verified,
            created_at: row.created_at,
            last_active: row.last_active,
        }
    }
}
