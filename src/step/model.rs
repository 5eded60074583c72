use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident;
use crate::timefmt;

/// Step status is free-form text from the client. Only this value carries
/// aggregation semantics.
pub const FAIL_STATUS: &str = "FAIL";

#[derive(Serialize, Deserialize, Clone, Debug, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[builder(default = ident::short_id(ident::STEP_PREFIX))]
    pub id: String,
    pub test_case_id: String,
    pub run_id: String,
    pub step_name: String,
    pub status: String,
    pub screenshot: Option<String>,
    pub error: Option<String>,
    #[serde(with = "timefmt")]
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "timefmt")]
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl Step {
    pub fn is_fail(&self) -> bool {
        self.status == FAIL_STATUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_identity_and_defaults() {
        let step = Step::builder()
            .test_case_id("TC3F9K2A".to_string())
            .run_id("run-1".to_string())
            .step_name("click login".to_string())
            .status("PASS".to_string())
            .build();
        assert!(step.id.starts_with("STEP"));
        assert_eq!(step.id.len(), 10);
        assert!(step.screenshot.is_none());
        assert!(step.error.is_none());
        assert!(!step.is_fail());
    }

    #[test]
    fn only_the_fail_status_counts_as_failure() {
        let mut step = Step::builder()
            .test_case_id("TC3F9K2A".to_string())
            .run_id("run-1".to_string())
            .step_name("submit form".to_string())
            .status("FAIL".to_string())
            .build();
        assert!(step.is_fail());

        step.status = "fail".to_string();
        assert!(!step.is_fail());
        step.status = "WARN".to_string();
        assert!(!step.is_fail());
    }

    #[test]
    fn serializes_to_the_wire_shape() {
        let step = Step::builder()
            .id("STEPB61X0P".to_string())
            .test_case_id("TC3F9K2A".to_string())
            .run_id("run-1".to_string())
            .step_name("click login".to_string())
            .status("PASS".to_string())
            .build();
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["id"], "STEPB61X0P");
        assert_eq!(value["testCaseId"], "TC3F9K2A");
        assert_eq!(value["stepName"], "click login");
        assert_eq!(value["status"], "PASS");
        assert_eq!(value["screenshot"], serde_json::Value::Null);
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
