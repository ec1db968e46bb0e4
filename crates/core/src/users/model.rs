use serde::{Deserialize, Serialize};

/// A student account. Serializes to the remote document shape; timestamps
/// are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
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

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_camel_case_document() {
        let user = User {
            id: "u1".into(),
            email: "jane@students.example.ac.ke".into(),
            first_name: "Jane".into(),
            last_name: "Mwangi".into(),
            student_id: "S101".into(),
            year_of_study: 2,
            is_verified: true,
            ..User::default()
        };
        let doc = serde_json::to_value(&user).unwrap();
        assert_eq!(doc["firstName"], "Jane");
        assert_eq!(doc["studentId"], "S101");
        assert_eq!(doc["yearOfStudy"], 2);
        assert_eq!(doc["isVerified"], true);
    }

    #[test]
    fn deserializes_sparse_document_with_defaults() {
        let user: User =
            serde_json::from_value(json!({ "id": "u1", "email": "jane@example.com" })).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.year_of_study, 0);
        assert!(!user.is_verified);
    }

    #[test]
    fn full_name_joins_both_parts() {
        let user = User {
            first_name: "Jane".into(),
            last_name: "Mwangi".into(),
            ..User::default()
        };
        assert_eq!(user.full_name(), "Jane Mwangi");
    }
}
