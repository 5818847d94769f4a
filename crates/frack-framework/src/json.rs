//! JSON request bodies and responses.

use async_trait::async_trait;
use frack_core::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use frack_core::{Failure, Outcome, Request, Response, Status};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;
use crate::extractor::FromRequest;
use crate::handler::IntoOutcome;

/// A JSON body.
///
/// As a handler argument it deserializes the request body; as a return value
/// it serializes into an `application/json` response.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct Car { make: String, model: String }
///
/// async fn cars() -> Json<Vec<Car>> {
///     Json(vec![Car { make: "Saab".into(), model: "900".into() }])
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T> FromRequest for Json<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_request(req: &mut Request) -> Result<Self, Failure> {
        let bytes = req.take_body().to_bytes().await?;
        let value = serde_json::from_slice(&bytes).map_err(ExtractError::InvalidJson)?;
        Ok(Json(value))
    }
}

impl<T> IntoOutcome for Json<T>
where
    T: Serialize,
{
    fn into_outcome(self) -> Outcome {
        let body = serde_json::to_vec(&self.0).map_err(Failure::new)?;
        Ok(Response::new(Status::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_header(CONTENT_LENGTH, HeaderValue::from(body.len()))
            .with_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Car {
        make: String,
        model: String,
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = Json(vec![Car {
            make: "Saab".to_string(),
            model: "900".to_string(),
        }])
        .into_outcome()
        .unwrap();

        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = response.into_body().to_bytes().await.unwrap();
        assert_eq!(&bytes[..], br#"[{"make":"Saab","model":"900"}]"#);
    }

    #[tokio::test]
    async fn test_json_extractor() {
        let mut req = Request::builder()
            .body(r#"{"make":"Volvo","model":"240"}"#)
            .build()
            .unwrap();
        let Json(car) = Json::<Car>::from_request(&mut req).await.unwrap();
        assert_eq!(car.make, "Volvo");
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_failure() {
        let mut req = Request::builder().body("{not json").build().unwrap();
        let err = Json::<Car>::from_request(&mut req).await.unwrap_err();
        assert!(err.to_string().starts_with("handler failed: invalid JSON body"));
    }
}
