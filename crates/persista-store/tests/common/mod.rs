//! Shared fixtures for backend tests

use persista_core::config::ConnectorConfig;
use persista_core::connector::{Connector, ModelType};
use persista_core::model;
use persista_store::DataConnector;
use tempfile::TempDir;

model! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct User {
        #[key]
        id: Option<i64>,
        username: String,
    }
}

model! {
    #[allow(dead_code)]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Membership {
        #[key]
        group_id: i64,
        #[key]
        user_id: i64,
        role: String,
    }
}

model! {
    #[allow(dead_code)]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Event {
        #[key]
        id: Option<i64>,
        title: String,
        at: Option<chrono::DateTime<chrono::Utc>>,
    }
}

#[allow(dead_code)]
pub fn user(username: &str) -> User {
    User {
        id: None,
        username: username.to_string(),
    }
}

#[allow(dead_code)]
pub fn models() -> Vec<ModelType> {
    vec![ModelType::of::<User>(), ModelType::of::<Membership>()]
}

#[allow(dead_code)]
pub fn config(driver: &str, dir: &TempDir) -> ConnectorConfig {
    ConnectorConfig {
        driver: Some(driver.to_string()),
        location: Some(dir.path().to_str().unwrap().to_string()),
        database: None,
    }
}

/// A set-up connector with `User` and `Membership` recorded
#[allow(dead_code)]
pub fn connect(driver: &str, dir: &TempDir) -> DataConnector {
    let mut connector = DataConnector::open(&config(driver, dir)).unwrap();
    connector.record_tables(&models()).unwrap();
    connector
}

/// Flush pending writes and drop the connector, as an application shutdown would
#[allow(dead_code)]
pub fn teardown(mut connector: DataConnector) {
    connector.tick().unwrap();
}
