use serde::{Deserialize, Serialize};

/// A counselor profile. List-valued fields are JSON arrays in the remote
/// document and JSON text columns in the cache.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Counselor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_image_url: String,
    pub specializations: Vec<String>,
    pub qualifications: Vec<String>,
    pub bio: String,
    pub years_of_experience: i32,
    pub is_available: bool,
    pub rating: f64,
    pub total_sessions: i32,
    pub office_location: String,
    pub working_hours: String,
    pub consultation_fee: f64,
    pub languages: Vec<String>,
    pub created_at: i64,
}

impl Counselor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }

    pub fn specializations_text(&self) -> String {
        self.specializations.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_lists_and_camel_case_fields() {
        let counselor = Counselor {
            id: "c1".into(),
            first_name: "Alice".into(),
            last_name: "Otieno".into(),
            specializations: vec!["Anxiety".into(), "Stress".into()],
            is_available: true,
            rating: 4.5,
            ..Counselor::default()
        };
        let doc = serde_json::to_value(&counselor).unwrap();
        assert_eq!(doc["isAvailable"], true);
        assert_eq!(doc["specializations"], json!(["Anxiety", "Stress"]));
        assert_eq!(doc["rating"], 4.5);
    }

    #[test]
    fn display_helpers() {
        let counselor = Counselor {
            first_name: "Alice".into(),
            last_name: "Otieno".into(),
            specializations: vec!["Anxiety".into(), "Depression".into()],
            ..Counselor::default()
        };
        assert_eq!(counselor.full_name(), "Dr. Alice Otieno");
        assert_eq!(counselor.specializations_text(), "Anxiety, Depression");
    }
}
