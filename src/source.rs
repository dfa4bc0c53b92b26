//! Live page sources.
//!
//! The detector and the CLI only need "the current page source and its URL";
//! [`WebDriverPage`] provides that from a real browser session.

use crate::error::ExtractError;
use fantoccini::{Client, ClientBuilder};
use std::future::Future;

/// Page source captured at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub source: String,
}

/// Something that can be sampled for its current page source
pub trait PageSource: Send {
    fn fetch(&mut self) -> impl Future<Output = Result<PageSnapshot, ExtractError>> + Send;
}

/// A browser tab driven over WebDriver
pub struct WebDriverPage {
    client: Client,
}

/// Endpoints tried after the configured one fails
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444",
];

impl WebDriverPage {
    /// Starts a session and navigates it to `page_url`
    pub async fn open(webdriver_url: &str, page_url: &str) -> Result<Self, ExtractError> {
        let client = connect(webdriver_url).await?;
        client.goto(page_url).await?;
        ::log::info!("Opened {} over WebDriver", page_url);
        Ok(Self { client })
    }

    /// Ends the WebDriver session
    pub async fn close(self) -> Result<(), ExtractError> {
        self.client.close().await?;
        Ok(())
    }
}

impl PageSource for WebDriverPage {
    fn fetch(&mut self) -> impl Future<Output = Result<PageSnapshot, ExtractError>> + Send {
        async move {
            let source = self.client.source().await?;
            let url = self.client.current_url().await?.to_string();
            Ok(PageSnapshot { url, source })
        }
    }
}

async fn connect(webdriver_url: &str) -> Result<Client, ExtractError> {
    let first_error = match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::warn!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e.to_string()
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if *url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(ExtractError::Connect(first_error))
}
