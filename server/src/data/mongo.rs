//! MongoDB-backed profile source

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Database};

use super::error::DataError;
use super::source::ProfileSource;
use crate::core::config::MongoConfig;
use crate::core::constants::{APP_NAME_LOWER, PROFILE_COLLECTION};
use crate::utils::json::bson_as_i64;

/// Server selection timeout for the initial connection and every query
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct MongoProfileSource {
    client: Client,
}

impl MongoProfileSource {
    /// Build a client and verify the deployment answers `{ping: 1}`.
    ///
    /// `serverSelectionTimeoutMS` in a custom URI overrides the default
    /// selection timeout.
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// server or bad credentials into an error here instead of on the first
    /// poll.
    pub async fn connect(config: &MongoConfig) -> Result<Self, DataError> {
        let target = config.display_target();
        let connection_failed = |reason: String| DataError::Connection {
            target: target.clone(),
            reason,
        };

        let mut options = ClientOptions::parse(config.connection_uri())
            .await
            .map_err(|e| connection_failed(e.to_string()))?;

        if config.uri.is_none()
            && let Some(username) = &config.username
        {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = config.password.clone();
            options.credential = Some(credential);
        }
        options.app_name = Some(APP_NAME_LOWER.to_string());
        options
            .server_selection_timeout
            .get_or_insert(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options).map_err(|e| connection_failed(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| connection_failed(e.to_string()))?;

        tracing::info!(endpoint = %target, "Connected to MongoDB");
        Ok(Self { client })
    }

    fn db(&self, name: &str) -> Database {
        self.client.database(name)
    }
}

#[async_trait]
impl ProfileSource for MongoProfileSource {
    async fn list_database_names(&self) -> Result<Vec<String>, DataError> {
        Ok(self.client.list_database_names().await?)
    }

    async fn profiling_level(&self, db: &str) -> Result<Option<i64>, DataError> {
        let reply = self.db(db).run_command(doc! { "profile": -1 }).await?;
        Ok(reply.get("was").and_then(bson_as_i64))
    }

    async fn has_profile_collection(&self, db: &str) -> Result<bool, DataError> {
        let names = self.db(db).list_collection_names().await?;
        Ok(names.iter().any(|n| n == PROFILE_COLLECTION))
    }

    async fn count_profile_entries(&self, db: &str) -> Result<u64, DataError> {
        Ok(self
            .db(db)
            .collection::<Document>(PROFILE_COLLECTION)
            .count_documents(doc! {})
            .await?)
    }

    async fn read_profile_entries(&self, db: &str) -> Result<Vec<Document>, DataError> {
        let cursor = self
            .db(db)
            .collection::<Document>(PROFILE_COLLECTION)
            .find(doc! {})
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let config = MongoConfig {
            uri: Some("not-a-mongodb-uri".to_string()),
            host: "unused".to_string(),
            port: 27017,
            username: None,
            password: None,
        };
        let err = match MongoProfileSource::connect(&config).await {
            Ok(_) => panic!("expected connection failure"),
            Err(e) => e,
        };
        assert!(matches!(err, DataError::Connection { .. }));
        assert!(err.to_string().contains("custom URI"));
    }
}
