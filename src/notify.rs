use crate::record::SetRecord;

/// Receives a copy of every set saved while remote mode is on.
pub trait NotificationSink {
    fn notify(&self, record: &SetRecord) -> Result<(), NotifyError>;
}

#[derive(Debug)]
pub enum NotifyError {
    /// The endpoint answered with a status outside 2xx.
    Status { code: u16, body: String },
    /// The request never got a response.
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// No webhook URL is configured.
    NotConfigured,
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Status { code, body } if body.is_empty() => {
                write!(f, "webhook responded with status {code}")
            }
            NotifyError::Status { code, body } => {
                write!(f, "webhook responded with status {code}: {body}")
            }
            NotifyError::Transport(e) => write!(f, "could not reach webhook: {e}"),
            NotifyError::NotConfigured => write!(f, "no webhook URL configured"),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotifyError::Transport(e) => Some(&**e),
            _ => None,
        }
    }
}

/// Posts each record as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl NotificationSink for WebhookSink {
    fn notify(&self, record: &SetRecord) -> Result<(), NotifyError> {
        if self.url.trim().is_empty() {
            return Err(NotifyError::NotConfigured);
        }
        log::info!("Attempting to send data to webhook: {}", self.url);
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(payload) = serde_json::to_string_pretty(record) {
                log::debug!("Data payload: {payload}");
            }
        }

        let result = match ureq::post(&self.url).send_json(record) {
            Ok(resp) if (200..300).contains(&resp.status()) => {
                let code = resp.status();
                let body = resp.into_string().unwrap_or_default();
                log::info!("Successfully sent data to webhook. Status code: {code}");
                log::debug!("Response content: {body}");
                Ok(())
            }
            Ok(resp) => {
                let code = resp.status();
                let body = resp.into_string().unwrap_or_default();
                Err(NotifyError::Status { code, body })
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(NotifyError::Status { code, body })
            }
            Err(e) => Err(NotifyError::Transport(Box::new(e))),
        };
        if let Err(e) = &result {
            log::error!("Failed to send data to webhook: {e}");
        }
        result
    }
}
