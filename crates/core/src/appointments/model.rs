use serde::{Deserialize, Serialize};

/// Appointment lifecycle. The set is closed; values serialize to the stored
/// document strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

/// How the session is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentKind {
    #[default]
    InPerson,
    VideoCall,
    PhoneCall,
}

/// A booked counseling session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub counselor_id: String,
    pub title: String,
    pub description: String,
    pub scheduled_date_time: i64,
    #[serde(rename = "duration")]
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub kind: AppointmentKind,
    pub location: String,
    pub meeting_link: String,
    pub notes: String,
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
            serde_json::to_value(AppointmentStatus::NoShow).unwrap(),
            json!("NO_SHOW")
        );
        assert_eq!(
            serde_json::to_value(AppointmentKind::VideoCall).unwrap(),
            json!("VIDEO_CALL")
        );
    }

    #[test]
    fn document_field_names_match_the_stored_shape() {
        let appointment = Appointment {
            id: "a1".into(),
            duration_minutes: 45,
            kind: AppointmentKind::PhoneCall,
            ..Appointment::default()
        };
        let doc = serde_json::to_value(&appointment).unwrap();
        assert_eq!(doc["duration"], 45);
        assert_eq!(doc["type"], "PHONE_CALL");
        assert_eq!(doc["status"], "PENDING");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: std::result::Result<AppointmentStatus, _> =
            serde_json::from_value(json!("RESCHEDULED"));
        assert!(result.is_err());
    }
}
