use std::time::Duration;

use cronx_model::HttpMethod;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{config::HttpConfig, error::ExecError, output::RunOutput};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Runs HTTP-type tasks: the task command is the target URL.
///
/// `POST` sends the URL's query string as a form body to the bare URL.
/// Anything but `200 OK` is a failure, with the response body kept as output.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    cfg: HttpConfig,
}

impl HttpExecutor {
    pub fn new(cfg: HttpConfig) -> Result<Self, ExecError> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| ExecError::Http(e.to_string()))?;
        Ok(Self { client, cfg })
    }

    pub async fn run(
        &self,
        url: &str,
        method: HttpMethod,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> RunOutput {
        let timeout = timeout.min(self.cfg.max_timeout);
        let request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => {
                let (target, params) = url.split_once('?').unwrap_or((url, ""));
                self.client
                    .post(target)
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(params.to_string())
            }
        }
        .timeout(timeout);

        trace!(target: "cronx.exec.http", %method, url, timeout_s = timeout.as_secs(), "request");
        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let out = tokio::select! {
            _ = cancel.cancelled() => RunOutput::failed(String::new(), ExecError::Cancelled),
            result = call => match result {
                Ok((status, body)) if status == StatusCode::OK => RunOutput::ok(body),
                Ok((status, body)) => {
                    RunOutput::failed(body, ExecError::HttpStatus { code: status.as_u16() })
                }
                Err(e) if e.is_timeout() => RunOutput::failed(String::new(), ExecError::TimedOut),
                Err(e) => RunOutput::failed(String::new(), ExecError::Http(e.to_string())),
            },
        };

        debug!(target: "cronx.exec.http", %method, url, error = ?out.error, "request finished");
        out
    }
}
