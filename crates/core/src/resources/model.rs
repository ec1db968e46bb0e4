use serde::{Deserialize, Serialize};

/// Topic of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceCategory {
    #[default]
    General,
    Anxiety,
    Depression,
    StressManagement,
    Relationships,
    AcademicPressure,
    SelfCare,
    Mindfulness,
    CrisisSupport,
}

/// Media format of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    #[default]
    Article,
    Video,
    Audio,
    Pdf,
    Interactive,
    Quiz,
}

/// A library item. `is_bookmarked` is a local-only flag and never reaches
/// the remote document; `likes` and `views` only move via increment ops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: ResourceCategory,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub image_url: String,
    pub video_url: String,
    pub audio_url: String,
    pub pdf_url: String,
    pub tags: Vec<String>,
    pub author: String,
    #[serde(rename = "readingTime")]
    pub reading_time_minutes: i32,
    pub is_bookmarked: bool,
    pub likes: i32,
    pub views: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_serialize_to_document_strings() {
        assert_eq!(
            serde_json::to_value(ResourceCategory::StressManagement).unwrap(),
            json!("STRESS_MANAGEMENT")
        );
        assert_eq!(
            serde_json::to_value(ResourceKind::Pdf).unwrap(),
            json!("PDF")
        );
    }

    #[test]
    fn document_field_names_match_the_stored_shape() {
        let resource = Resource {
            id: "r1".into(),
            kind: ResourceKind::Video,
            reading_time_minutes: 7,
            tags: vec!["exams".into()],
            ..Resource::default()
        };
        let doc = serde_json::to_value(&resource).unwrap();
        assert_eq!(doc["type"], "VIDEO");
        assert_eq!(doc["readingTime"], 7);
        assert_eq!(doc["tags"], json!(["exams"]));
    }

    #[test]
    fn sparse_document_falls_back_to_defaults() {
        let resource: Resource =
            serde_json::from_value(json!({ "id": "r1", "title": "Breathing" })).unwrap();
        assert_eq!(resource.category, ResourceCategory::General);
        assert_eq!(resource.kind, ResourceKind::Article);
        assert_eq!(resource.likes, 0);
    }
}
