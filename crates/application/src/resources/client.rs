//! Generic CRUD client over the token gate.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sims_domain::{CallFailure, DomainError, DomainResult, FailureStatus};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::AuthorizedApi;

/// A record type exposed as a REST collection.
///
/// `GET PATH` lists, `POST PATH` creates, `PUT PATH` updates with the full
/// record and `DELETE PATH/{id}` deletes.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection path.
    const PATH: &'static str;
    /// Singular name used in logs.
    const NAME: &'static str;

    /// Server-assigned identifier.
    type Id: Display + Copy + Send + Sync;

    /// Identifier, once the server assigned one.
    fn id(&self) -> Option<Self::Id>;

    /// Copy of the record without its identifier, as sent on create.
    #[must_use]
    fn without_id(&self) -> Self;

    /// Checks the record before it is sent.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    fn validate(&self) -> DomainResult<()>;
}

/// Why a CRUD call did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    /// The record failed local validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The call was refused locally or failed remotely.
    #[error(transparent)]
    Call(#[from] CallFailure),

    /// Update or delete of a record that has no id.
    #[error("record has no id")]
    MissingId,

    /// A 2xx answer whose body is not what the operation returns.
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl ResourceError {
    /// Status of the failed call, if a call was attempted.
    #[must_use]
    pub const fn failure_status(&self) -> Option<FailureStatus> {
        match self {
            Self::Call(failure) => Some(failure.status),
            Self::Invalid(_) | Self::MissingId | Self::UnexpectedBody(_) => None,
        }
    }
}

/// CRUD calls for one resource type.
pub struct ResourceClient<R> {
    api: AuthorizedApi,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient").field("api", &self.api).finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    /// Creates a client sending through `api`.
    #[must_use]
    pub const fn new(api: AuthorizedApi) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    /// Fetches the whole collection.
    ///
    /// Elements that do not decode as a record are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body is not a list.
    pub async fn list(&self) -> Result<Vec<R>, ResourceError> {
        let (_, body) = self.api.get(R::PATH).await.into_result()?;
        let Value::Array(elements) = body else {
            return Err(ResourceError::UnexpectedBody(format!(
                "expected a list of {} records",
                R::NAME
            )));
        };

        let total = elements.len();
        let records: Vec<R> = elements
            .into_iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let id = element.get("id").cloned().unwrap_or(Value::Null);
                serde_json::from_value(element)
                    .map_err(|e| {
                        warn!(
                            resource = R::NAME,
                            index,
                            id = %id,
                            error = %e,
                            "Skipping unreadable record"
                        );
                    })
                    .ok()
            })
            .collect();
        debug!(
            resource = R::NAME,
            count = records.len(),
            skipped = total - records.len(),
            "Listed records"
        );
        Ok(records)
    }

    /// Creates `record` (its id, if any, is not sent).
    ///
    /// Returns the created record when the server echoes it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is invalid or the call fails.
    pub async fn create(&self, record: &R) -> Result<Option<R>, ResourceError> {
        record.validate()?;
        let payload = to_payload(&record.without_id())?;
        let (_, body) = self.api.post(R::PATH, payload).await.into_result()?;
        Ok(Self::echoed(body))
    }

    /// Replaces the stored record with `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no id, is invalid, or the call fails.
    pub async fn update(&self, record: &R) -> Result<Option<R>, ResourceError> {
        if record.id().is_none() {
            return Err(ResourceError::MissingId);
        }
        record.validate()?;
        let payload = to_payload(record)?;
        let (_, body) = self.api.put(R::PATH, payload).await.into_result()?;
        Ok(Self::echoed(body))
    }

    /// Deletes the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn delete(&self, id: R::Id) -> Result<(), ResourceError> {
        let path = format!("{}/{id}", R::PATH);
        self.api.delete(&path).await.into_result()?;
        Ok(())
    }

    fn echoed(body: Value) -> Option<R> {
        if body.is_null() {
            return None;
        }
        match serde_json::from_value(body) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(resource = R::NAME, error = %e, "Server echoed an unreadable record");
                None
            }
        }
    }
}

fn to_payload(record: &impl Serialize) -> Result<Value, ResourceError> {
    serde_json::to_value(record).map_err(|e| ResourceError::UnexpectedBody(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::TokenStore;
    use crate::resources::MealsClient;
    use crate::test_support::{MemoryStorage, RecordingHttpClient};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sims_domain::{HttpMethod, Meal, MealCategory, MealId};
    use std::sync::Arc;

    async fn meals(http: RecordingHttpClient) -> (MealsClient, Arc<RecordingHttpClient>) {
        let http = Arc::new(http);
        let store = TokenStore::new(Arc::new(MemoryStorage::default()));
        store.set("abc.def.ghi").await.unwrap();
        let api = AuthorizedApi::new(ApiClient::new(http.clone()), store, "http://api.test");
        (MealsClient::new(api), http)
    }

    #[tokio::test]
    async fn test_list_decodes_records() {
        let (client, _) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Get,
            "/api/repas",
            200,
            r#"[{"id":1,"nom":"Soupe","typeRepas":"entrée","prix":"4,50","relation":null,"description":"","idUser":1}]"#,
        ))
        .await;

        let records = client.list().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(MealId(1)));
        assert_eq!(records[0].category, MealCategory::Starter);
        assert!((records[0].price - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_records() {
        let (client, _) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Get,
            "/api/repas",
            200,
            r#"[
                {"id":1,"nom":"Soupe","typeRepas":"entrée","prix":4.5},
                {"id":2,"nom":"Pancakes","typeRepas":"brunch","prix":6},
                {"id":3,"nom":"Mystère","typeRepas":null,"prix":null},
                {"id":4,"nom":"Tarte","typeRepas":"dessert","prix":"3,20"}
            ]"#,
        ))
        .await;

        let records = client.list().await.unwrap();

        assert_eq!(
            records.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![Some(MealId(1)), Some(MealId(4))]
        );
    }

    #[tokio::test]
    async fn test_list_rejects_non_array() {
        let (client, _) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Get,
            "/api/repas",
            200,
            r#"{"items":[]}"#,
        ))
        .await;

        assert!(matches!(
            client.list().await,
            Err(ResourceError::UnexpectedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_create_sends_record_without_id() {
        let (client, http) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Post,
            "/api/repas",
            201,
            r#"{"id":7,"nom":"Salade","typeRepas":"entrée","prix":5.5}"#,
        ))
        .await;
        let meal = Meal::new("Salade", MealCategory::Starter, 5.5).with_id(MealId(99));

        let created = client.create(&meal).await.unwrap().unwrap();

        assert_eq!(created.id, Some(MealId(7)));
        let body = http.requests()[0].body.clone().unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["nom"], json!("Salade"));
        assert_eq!(body["typeRepas"], json!("entrée"));
    }

    #[tokio::test]
    async fn test_invalid_record_not_sent() {
        let (client, http) = meals(RecordingHttpClient::new()).await;
        let meal = Meal::new("  ", MealCategory::Main, 3.0);

        assert!(matches!(
            client.create(&meal).await,
            Err(ResourceError::Invalid(_))
        ));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let (client, http) = meals(RecordingHttpClient::new()).await;
        let meal = Meal::new("Tarte", MealCategory::Dessert, 3.0);

        assert_eq!(client.update(&meal).await, Err(ResourceError::MissingId));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_puts_full_record_to_collection() {
        let (client, http) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Put,
            "/api/repas",
            200,
            "",
        ))
        .await;
        let meal = Meal::new("Tarte", MealCategory::Dessert, 3.0).with_id(MealId(3));

        assert_eq!(client.update(&meal).await, Ok(None));
        let sent = &http.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/repas");
        assert_eq!(sent.body.as_ref().unwrap()["id"], json!(3));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (client, http) = meals(RecordingHttpClient::new().respond(
            HttpMethod::Delete,
            "/api/repas/42",
            404,
            "",
        ))
        .await;

        let err = client.delete(MealId(42)).await.unwrap_err();

        assert_eq!(err.failure_status(), Some(FailureStatus::Http(404)));
        assert_eq!(http.count(HttpMethod::Delete, "/api/repas/42"), 1);
    }
}
