pub mod response;

pub use response::Response;

/// Multipart field the service reads the upload from.
pub const IMAGE_FIELD: &str = "image";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/detect";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("serde: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("response body was null")]
    NullBody,

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[async_trait::async_trait]
pub trait Detector {
    async fn detect(&self, file: &crate::selection::SelectedFile) -> Result<Response, anyhow::Error>;
}

pub struct Client {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<std::time::Duration>,
}

impl Client {
    pub fn new(endpoint: impl Into<String>, timeout: Option<std::time::Duration>) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::ClientBuilder::new().build()?,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    fn form(file: &crate::selection::SelectedFile) -> Result<reqwest::multipart::Form, Error> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        Ok(reqwest::multipart::Form::new().part(IMAGE_FIELD, part))
    }

    async fn do_request(&self, file: &crate::selection::SelectedFile) -> Result<Response, Error> {
        let resp = self.client.post(&self.endpoint).multipart(Self::form(file)?).send().await?;

        // The service answers errors with a JSON body too, so the status only
        // gets noted here and the body decides what is shown.
        if !resp.status().is_success() {
            log::warn!("detector returned {}", resp.status());
        }

        let body = resp.bytes().await?;
        let body = serde_json::from_slice::<serde_json::Value>(&body)?;
        if body.is_null() {
            return Err(Error::NullBody);
        }
        Ok(Response::new(body))
    }

    pub async fn detect(&self, file: &crate::selection::SelectedFile) -> Result<Response, Error> {
        log::info!("uploading {} ({} bytes) to {}", file.name, file.bytes.len(), self.endpoint);
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.do_request(file))
                .await
                .map_err(|_| Error::Timeout(timeout))?,
            None => self.do_request(file).await,
        }
    }
}

#[async_trait::async_trait]
impl Detector for Client {
    async fn detect(&self, file: &crate::selection::SelectedFile) -> Result<Response, anyhow::Error> {
        Ok(Client::detect(self, file).await?)
    }
}
