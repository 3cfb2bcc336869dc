use crate::application::ports::{VerificationOutcome, VerificationRequest, Verifier};
use crate::domain::errors::HarnessError;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use ethers::utils::hex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Etherscan-style API envelope.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: String,
}

impl ExplorerResponse {
    fn rejection(self) -> HarnessError {
        HarnessError::Verification(format!("{}: {}", self.message, self.result))
    }
}

/// Source verification against an Etherscan-compatible explorer (Snowtrace, Etherscan).
pub struct ExplorerVerifier {
    client: Client,
    api_url: String,
    api_key: String,
    backoff_settings: ExponentialBackoff,
}

impl ExplorerVerifier {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            backoff_settings: ExponentialBackoff {
                initial_interval: Duration::from_secs(3),
                max_elapsed_time: Some(Duration::from_secs(120)),
                ..ExponentialBackoff::default()
            },
        }
    }

    // For testing purposes
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff_settings = backoff;
        self
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, HarnessError> {
        let source = serde_json::to_string(&request.source)
            .map_err(|e| HarnessError::Verification(format!("encode source: {}", e)))?;
        let form = [
            ("apikey", self.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", format!("{:?}", request.address)),
            ("sourceCode", source),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", request.contract_name.clone()),
            ("compilerversion", request.compiler_version.clone()),
            // Misspelling is part of the explorer API.
            ("constructorArguements", hex::encode(&request.constructor_args)),
        ];

        let operation = || async {
            let body: ExplorerResponse = self
                .client
                .post(&self.api_url)
                .form(&form)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(HarnessError::Verification(e.to_string())))?
                .json()
                .await
                .map_err(|e| {
                    backoff::Error::permanent(HarnessError::Verification(format!(
                        "Parse error: {}",
                        e
                    )))
                })?;

            if body.status == "1" {
                return Ok(Submission::Pending(body.result));
            }
            let lowered = body.result.to_lowercase();
            if lowered.contains("already verified") {
                return Ok(Submission::AlreadyVerified);
            }
            // Freshly deployed code is not always indexed yet.
            if lowered.contains("unable to locate contractcode") {
                return Err(backoff::Error::transient(HarnessError::Verification(body.result)));
            }
            Err(backoff::Error::permanent(body.rejection()))
        };

        retry(self.backoff_settings.clone(), operation).await
    }

    async fn poll(&self, guid: &str) -> Result<VerificationOutcome, HarnessError> {
        let operation = || async {
            let body: ExplorerResponse = self
                .client
                .get(&self.api_url)
                .query(&[
                    ("apikey", self.api_key.as_str()),
                    ("module", "contract"),
                    ("action", "checkverifystatus"),
                    ("guid", guid),
                ])
                .send()
                .await
                .map_err(|e| backoff::Error::transient(HarnessError::Verification(e.to_string())))?
                .json()
                .await
                .map_err(|e| {
                    backoff::Error::permanent(HarnessError::Verification(format!(
                        "Parse error: {}",
                        e
                    )))
                })?;

            let lowered = body.result.to_lowercase();
            if lowered.contains("pending") {
                return Err(backoff::Error::transient(HarnessError::Verification(body.result)));
            }
            if lowered.contains("already verified") {
                return Ok(VerificationOutcome::AlreadyVerified);
            }
            if body.status == "1" || lowered.starts_with("pass") {
                return Ok(VerificationOutcome::Verified);
            }
            Err(backoff::Error::permanent(body.rejection()))
        };

        retry(self.backoff_settings.clone(), operation).await
    }
}

enum Submission {
    Pending(String),
    AlreadyVerified,
}

#[async_trait]
impl Verifier for ExplorerVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, HarnessError> {
        info!(
            address = ?request.address,
            contract = %request.contract_name,
            "Submitting source for verification"
        );

        let outcome = match self.submit(request).await? {
            Submission::AlreadyVerified => VerificationOutcome::AlreadyVerified,
            Submission::Pending(guid) => self.poll(&guid).await?,
        };

        match outcome {
            VerificationOutcome::Verified => info!("Successfully verified {:?}", request.address),
            VerificationOutcome::AlreadyVerified => {
                warn!("{:?} is already verified", request.address)
            }
        }
        Ok(outcome)
    }
}
