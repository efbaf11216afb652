//! Conversions between `cronx-model` types and generated protobuf types.

use cronx_model::{HttpMethod, TaskKind, TaskRequest};

use crate::{error::WireError, proto};

impl From<HttpMethod> for proto::HttpMethod {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => proto::HttpMethod::Get,
            HttpMethod::Post => proto::HttpMethod::Post,
        }
    }
}

impl From<proto::HttpMethod> for HttpMethod {
    fn from(method: proto::HttpMethod) -> Self {
        match method {
            proto::HttpMethod::Get => HttpMethod::Get,
            proto::HttpMethod::Post => HttpMethod::Post,
        }
    }
}

/// The timeout on the wire is always the normalized one.
impl From<&TaskRequest> for proto::TaskRequest {
    fn from(req: &TaskRequest) -> Self {
        let (protocol, method) = match req.kind {
            TaskKind::Shell => (proto::TaskProtocol::Shell, proto::HttpMethod::Get),
            TaskKind::Http { method } => (proto::TaskProtocol::Http, method.into()),
        };
        proto::TaskRequest {
            id: req.id,
            command: req.command.clone(),
            timeout: req.timeout().secs() as i32,
            protocol: protocol as i32,
            http_method: method as i32,
        }
    }
}

impl TryFrom<proto::TaskRequest> for TaskRequest {
    type Error = WireError;

    fn try_from(req: proto::TaskRequest) -> Result<Self, Self::Error> {
        let protocol = proto::TaskProtocol::try_from(req.protocol)
            .map_err(|_| WireError::UnknownProtocol(req.protocol))?;

        let kind = match protocol {
            proto::TaskProtocol::Shell => TaskKind::Shell,
            proto::TaskProtocol::Http => {
                let method = proto::HttpMethod::try_from(req.http_method)
                    .map_err(|_| WireError::UnknownHttpMethod(req.http_method))?;
                TaskKind::Http {
                    method: method.into(),
                }
            }
        };

        Ok(TaskRequest {
            id: req.id,
            command: req.command,
            timeout_secs: i64::from(req.timeout),
            kind,
        })
    }
}
