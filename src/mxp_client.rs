use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::UpstreamConfig,
    domain::operations::{IcafeLookup, OperationRequest, ResponseShape},
    errors::AppError,
};

pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Json(Value),
    Image { content_type: String, bytes: Bytes },
}

#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    async fn fetch(&self, request: &OperationRequest) -> Result<UpstreamPayload, AppError>;
}

/// HTTP client for the MXP backend.
///
/// Holds only immutable configuration and a connection pool, so one instance is
/// shared by every in-flight request.
#[derive(Debug, Clone)]
pub struct MxpClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl MxpClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| AppError::internal(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Resolves the backend URL for a request. No query string is emitted when the
    /// request carries no parameters.
    pub fn request_url(&self, request: &OperationRequest) -> Url {
        let descriptor = request.operation.descriptor();
        let mut url = self.base_url.clone();
        let path = format!(
            "{}{}",
            self.base_url.path().trim_end_matches('/'),
            descriptor.path
        );
        url.set_path(&path);
        url.set_query(None);

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        url
    }

    pub async fn account(&self, charge_id: i64) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::account(charge_id)).await
    }

    pub async fn crew(&self, pin: Option<i64>) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::crew(pin)).await
    }

    pub async fn folio(
        &self,
        folio_id: i64,
        date_from: Option<chrono::NaiveDate>,
        date_to: Option<chrono::NaiveDate>,
    ) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::folio(folio_id, date_from, date_to))
            .await
    }

    pub async fn document(&self, document_id: i64) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::document(document_id)).await
    }

    pub async fn icafe(&self, lookup: &IcafeLookup) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::icafe(lookup)).await
    }

    pub async fn person_image(&self, person_id: i64) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::person_image(person_id)).await
    }

    pub async fn quick_code(&self) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::quick_code()).await
    }

    pub async fn sailor_manifest(
        &self,
        installation_code: Option<&str>,
        voyage_embark_date: Option<chrono::NaiveDate>,
        voyage_debark_date: Option<chrono::NaiveDate>,
    ) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::sailor_manifest(
            installation_code,
            voyage_embark_date,
            voyage_debark_date,
        ))
        .await
    }

    pub async fn receipt_image(&self, receipt_id: i64) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::receipt_image(receipt_id)).await
    }

    pub async fn person_invoice(&self, person_id: i64) -> Result<UpstreamPayload, AppError> {
        self.fetch(&OperationRequest::person_invoice(person_id)).await
    }
}

#[async_trait]
impl UpstreamProvider for MxpClient {
    async fn fetch(&self, request: &OperationRequest) -> Result<UpstreamPayload, AppError> {
        let descriptor = request.operation.descriptor();
        let url = self.request_url(request);

        debug!(
            operation = descriptor.name,
            path = descriptor.path,
            params = request.query.len(),
            "calling mxp backend"
        );

        let response = self
            .http
            .request(descriptor.method.clone(), url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|err| connectivity_error(descriptor.name, &err))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| connectivity_error(descriptor.name, &err))?;

        if !status.is_success() {
            warn!(
                operation = descriptor.name,
                status = status.as_u16(),
                "mxp backend returned error status"
            );
            return Err(AppError::upstream(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        match descriptor.shape {
            ResponseShape::Image => Ok(UpstreamPayload::Image {
                content_type: content_type
                    .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string()),
                bytes: body,
            }),
            ResponseShape::Object | ResponseShape::List => serde_json::from_slice(&body)
                .map(UpstreamPayload::Json)
                .map_err(|err| {
                    AppError::response_format(format!(
                        "{} returned a non-JSON body: {err}",
                        descriptor.name
                    ))
                }),
        }
    }
}

fn connectivity_error(operation: &str, err: &reqwest::Error) -> AppError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };

    warn!(operation, error = %err, "mxp backend unreachable");
    AppError::connectivity(reason)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(base_url: &str, timeout: Duration) -> MxpClient {
        MxpClient::new(&UpstreamConfig {
            base_url: Url::parse(base_url).expect("valid base url"),
            username: "gateway".to_string(),
            password: "s3cret".to_string(),
            timeout,
        })
        .expect("client build")
    }

    fn mock_client(server: &MockServer) -> MxpClient {
        client_for(
            &format!("{}/MXP_Virgin.exe", server.uri()),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn request_urls_follow_fixed_templates() {
        let client = client_for("http://mxp.test/MXP_Virgin.exe/", Duration::from_secs(1));
        let day = |value: &str| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();

        let cases = [
            (
                OperationRequest::account(10000004),
                "http://mxp.test/MXP_Virgin.exe/account?charge_id=10000004",
            ),
            (
                OperationRequest::crew(None),
                "http://mxp.test/MXP_Virgin.exe/crew",
            ),
            (
                OperationRequest::crew(Some(88)),
                "http://mxp.test/MXP_Virgin.exe/crew?PIN=88",
            ),
            (
                OperationRequest::folio(55, day("2024-01-01"), day("2024-01-31")),
                "http://mxp.test/MXP_Virgin.exe/folio?folio_id=55&date_from=2024-01-01&date_to=2024-01-31",
            ),
            (
                OperationRequest::document(42),
                "http://mxp.test/MXP_Virgin.exe/document?document_id=42",
            ),
            (
                OperationRequest::icafe(&IcafeLookup::default()),
                "http://mxp.test/MXP_Virgin.exe/iCafe",
            ),
            (
                OperationRequest::icafe(&IcafeLookup {
                    icafe_id: Some(3),
                    ..IcafeLookup::default()
                }),
                "http://mxp.test/MXP_Virgin.exe/iCafe?icafe_id=3",
            ),
            (
                OperationRequest::icafe(&IcafeLookup {
                    room_nr: Some("8123".to_string()),
                    date_of_birth: day("1980-04-02"),
                    ..IcafeLookup::default()
                }),
                "http://mxp.test/MXP_Virgin.exe/iCafe?room_nr=8123&date_of_birth=1980-04-02",
            ),
            (
                OperationRequest::icafe(&IcafeLookup {
                    last_name: Some("O'Neil Smith".to_string()),
                    pin: Some(4711),
                    ..IcafeLookup::default()
                }),
                "http://mxp.test/MXP_Virgin.exe/iCafe?last_name=O%27Neil+Smith&pin=4711",
            ),
            (
                OperationRequest::person_image(901),
                "http://mxp.test/MXP_Virgin.exe/personImageById?person_id=901",
            ),
            (
                OperationRequest::quick_code(),
                "http://mxp.test/MXP_Virgin.exe/quickCode",
            ),
            (
                OperationRequest::sailor_manifest(Some("SC"), day("2024-03-01"), None),
                "http://mxp.test/MXP_Virgin.exe/sailorManifest?installation_code=SC&voyage_embark_date=2024-03-01",
            ),
            (
                OperationRequest::receipt_image(77),
                "http://mxp.test/MXP_Virgin.exe/receiptImage?receipt_id=77",
            ),
            (
                OperationRequest::person_invoice(901),
                "http://mxp.test/MXP_Virgin.exe/personInvoice?person_id=901",
            ),
        ];

        for (request, expected) in cases {
            assert_eq!(client.request_url(&request).as_str(), expected);
        }
    }

    #[test]
    fn request_url_without_base_path() {
        let client = client_for("https://mxp.test", Duration::from_secs(1));
        assert_eq!(
            client.request_url(&OperationRequest::quick_code()).as_str(),
            "https://mxp.test/quickCode"
        );
    }

    #[tokio::test]
    async fn account_returns_upstream_json_unmodified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/account"))
            .and(query_param("charge_id", "10000004"))
            .and(basic_auth("gateway", "s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 42 })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = mock_client(&server)
            .account(10000004)
            .await
            .expect("account lookup");

        assert_eq!(payload, UpstreamPayload::Json(json!({ "balance": 42 })));
    }

    #[tokio::test]
    async fn not_found_surfaces_upstream_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/document"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "response_code": "NOT_FOUND" })),
            )
            .mount(&server)
            .await;

        let error = mock_client(&server)
            .document(999)
            .await
            .expect_err("expected upstream error");

        match error {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("NOT_FOUND"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn auth_rejection_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let error = mock_client(&server)
            .quick_code()
            .await
            .expect_err("expected upstream error");

        assert!(matches!(error, AppError::Upstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn slow_backend_surfaces_connectivity_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/crew"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = client_for(
            &format!("{}/MXP_Virgin.exe", server.uri()),
            Duration::from_millis(200),
        );
        let error = tokio::time::timeout(Duration::from_secs(3), client.crew(None))
            .await
            .expect("client must give up before the outer timeout")
            .expect_err("expected connectivity error");

        assert!(matches!(error, AppError::Connectivity { .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_surfaces_connectivity_error() {
        let client = client_for("http://127.0.0.1:1/MXP_Virgin.exe", Duration::from_secs(2));

        let error = client
            .account(1)
            .await
            .expect_err("expected connectivity error");

        assert!(matches!(error, AppError::Connectivity { .. }));
    }

    #[tokio::test]
    async fn non_json_body_surfaces_response_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/personInvoice"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = mock_client(&server)
            .person_invoice(5)
            .await
            .expect_err("expected format error");

        assert!(matches!(error, AppError::ResponseFormat { .. }));
    }

    #[tokio::test]
    async fn icafe_without_identifier_sends_no_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/iCafe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessions": [] })))
            .expect(2)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        client
            .icafe(&IcafeLookup::default())
            .await
            .expect("icafe without id");
        client
            .icafe(&IcafeLookup {
                icafe_id: Some(12),
                ..IcafeLookup::default()
            })
            .await
            .expect("icafe with id");

        let received = server.received_requests().await.expect("recording enabled");
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].url.query(), None);
        assert_eq!(received[1].url.query(), Some("icafe_id=12"));
    }

    #[tokio::test]
    async fn image_operation_returns_raw_bytes_and_content_type() {
        let server = MockServer::start().await;
        let image = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/personImageById"))
            .and(query_param("person_id", "901"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(image.clone(), "image/png"))
            .mount(&server)
            .await;

        let payload = mock_client(&server)
            .person_image(901)
            .await
            .expect("person image");

        assert_eq!(
            payload,
            UpstreamPayload::Image {
                content_type: "image/png".to_string(),
                bytes: Bytes::from(image),
            }
        );
    }

    #[tokio::test]
    async fn concurrent_calls_complete_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/account"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "charge_id": 1 }))
                    .set_delay(Duration::from_millis(100)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/MXP_Virgin.exe/quickCode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "code": "QC1" }])))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let (account, quick_codes) = tokio::join!(client.account(1), client.quick_code());

        assert_eq!(
            account.expect("account"),
            UpstreamPayload::Json(json!({ "charge_id": 1 }))
        );
        assert_eq!(
            quick_codes.expect("quick codes"),
            UpstreamPayload::Json(json!([{ "code": "QC1" }]))
        );
    }
}
