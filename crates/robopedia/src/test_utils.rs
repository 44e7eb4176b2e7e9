use crate::api::RobopediaApi;
use chrono::{DateTime, Utc};
use crate::dataset::StaticDataset;
use crate::model::{NewsArticle, NewsDraft, Robot, RobotDraft, UserDraft};
use crate::record::Record;
use crate::slug::slugify;
use crate::store::mem_backend::MemBackend;

/// A robot as the bundled dataset would hold it: no timestamps, so two fixtures
/// built from the same name compare equal.
pub fn robot(id: &str, name: &str) -> Robot {
    let mut robot = Robot::from_draft(id.to_string(), slugify(name), RobotDraft::named(name));
    robot.created_at = None;
    robot.updated_at = None;
    robot
}

/// 2024-01-15T00:00:00Z
fn fixed_date() -> DateTime<Utc> {
    DateTime::from_timestamp(1_705_276_800, 0).unwrap_or_default()
}

/// A valid user draft with password `secret`.
pub fn user_draft(email: &str) -> UserDraft {
    UserDraft {
        email: Some(email.to_string()),
        name: Some("Test User".to_string()),
        password: Some("secret".to_string()),
        ..Default::default()
    }
}

/// Two robots (Atlas, Sophia) and one article, no users.
pub fn sample_dataset() -> StaticDataset {
    let mut sophia = robot("robot-002", "Sophia");
    sophia.manufacturer = "Hanson Robotics".to_string();
    sophia.category = "Social".to_string();

    let article = NewsArticle::from_draft(
        "news-001".to_string(),
        "atlas-news".to_string(),
        NewsDraft {
            related_robots: Some(vec!["robot-001".to_string()]),
            publish_date: Some(fixed_date()),
            ..NewsDraft::titled("Atlas News")
        },
    );

    StaticDataset::empty()
        .with_robots(vec![robot("robot-001", "Atlas"), sophia])
        .with_news(vec![article])
}

pub struct TestEnv {
    pub api: RobopediaApi<MemBackend>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_backend(MemBackend::new())
    }

    pub fn with_backend(backend: MemBackend) -> Self {
        Self {
            api: RobopediaApi::new(backend, sample_dataset()),
        }
    }

    pub fn backend(&self) -> &MemBackend {
        self.api.backend()
    }
}
