// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use async_trait::async_trait;
use log::debug;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::{
    error::{Api, Result},
    metadata,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Body {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

#[derive(Clone, Debug)]
pub(crate) struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Body,
    pub(crate) bearer: Option<SecretString>,
}

impl Request {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            bearer: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub(crate) fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub(crate) fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    pub(crate) fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub(crate) fn with_form<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(
        mut self,
        fields: I,
    ) -> Self {
        self.body = Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        );
        self
    }

    /// The `Authorization` header value, when a bearer credential is attached.
    pub(crate) fn authorization(&self) -> Option<String> {
        self.bearer
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Response {
    pub(crate) status: u16,
    pub(crate) body: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

impl Response {
    pub(crate) const UNAUTHORIZED: u16 = 401;

    pub(crate) const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub(crate) fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The server's `{"detail": ...}` message. Structured details (such as
    /// validation errors) are rendered as JSON text.
    pub(crate) fn detail(&self) -> Option<String> {
        let detail = serde_json::from_slice::<ErrorDetail>(&self.body).ok()?.detail;
        match detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub(crate) fn into_error(self) -> Api {
        let detail = self.detail();
        if self.status == Self::UNAUTHORIZED {
            Api::Unauthorized { detail }
        } else {
            Api::Status {
                status: self.status,
                detail,
            }
        }
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: Request) -> Result<Response>;
}

pub(crate) struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub(crate) fn new(base_url: Url) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(metadata::USER_AGENT.as_str())
                .build()?,
            base_url,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: Request) -> Result<Response> {
        let url = self.base_url.join(req.path.trim_start_matches('/'))?;
        debug!("{} {}", req.method, url);

        let mut builder = match req.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(authorization) = req.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        builder = match req.body {
            Body::Empty => builder,
            Body::Json(ref value) => builder.json(value),
            Body::Form(ref fields) => builder.form(fields),
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!("Server responded with status {}", status);
        Ok(Response { status, body })
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detail_is_extracted() {
        let resp = Response {
            status: 401,
            body: json!({"detail": "Incorrect email or password"})
                .to_string()
                .into_bytes(),
        };
        assert_eq!(resp.detail().as_deref(), Some("Incorrect email or password"));
        assert!(matches!(
            resp.into_error(),
            Api::Unauthorized { detail: Some(ref d) } if d == "Incorrect email or password"
        ));
    }

    #[test]
    fn missing_or_structured_detail() {
        let resp = Response {
            status: 500,
            body: b"Internal Server Error".to_vec(),
        };
        assert_eq!(resp.detail(), None);
        assert!(matches!(
            resp.into_error(),
            Api::Status {
                status: 500,
                detail: None
            }
        ));

        let resp = Response {
            status: 422,
            body: json!({"detail": [{"msg": "field required"}]})
                .to_string()
                .into_bytes(),
        };
        assert_eq!(
            resp.detail().as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn authorization_header() {
        let req = Request::get("/users/me");
        assert_eq!(req.authorization(), None);

        let req = Request {
            bearer: Some(SecretString::new("abc".to_owned())),
            ..req
        };
        assert_eq!(req.authorization().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn form_and_query_building() {
        let req = Request::post("/token")
            .with_form([("username", "a@b.com"), ("password", "hunter2")])
            .with_query("status", "TODO");
        assert_eq!(
            req.body,
            Body::Form(vec![
                ("username".to_owned(), "a@b.com".to_owned()),
                ("password".to_owned(), "hunter2".to_owned()),
            ])
        );
        assert_eq!(req.query, vec![("status".to_owned(), "TODO".to_owned())]);
    }
}
