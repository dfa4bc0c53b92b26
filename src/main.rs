use chrono::Utc;
use clap::Parser;
use page_chat::config::AppConfig;
use page_chat::dom::HtmlDocument;
use page_chat::extract::{ContentRequest, ExtractResponse, handle_request};
use page_chat::source::{PageSource, WebDriverPage};
use page_chat::transcript::{FileStorage, MessageInput};
use page_chat::{ChangeDetector, ChatEntry, Persist, Transcript, TranscriptKey, TranscriptStore};
use std::error::Error;
use std::io::Read;
use tokio::sync::mpsc;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args.command, config).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    }
    .with_env();

    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(webdriver) = &args.webdriver {
        config.webdriver_url = webdriver.clone();
    }
    Ok(config)
}

async fn run(command: Command, config: AppConfig) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Extract { url, file } => {
            let response = match file {
                Some(path) => {
                    let source = std::fs::read_to_string(path)?;
                    handle_request(ContentRequest::GetPageText, &HtmlDocument::parse(&source, url))
                }
                None => extract_live(&config.webdriver_url, &url).await,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Watch { url } => watch(&config, &url).await?,
        Command::Format => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            println!("{}", page_chat::format_message(&input));
        }
        Command::Say {
            url,
            message,
            role,
            json,
            no_persist,
        } => {
            let entry = if json {
                let value: serde_json::Value = serde_json::from_str(&message)?;
                MessageInput::from_value(&value)
                    .map(ChatEntry::from)
                    .ok_or("Unsupported message shape")?
            } else {
                ChatEntry {
                    role: role.into(),
                    content: message,
                }
            };

            let mut store = open_store(&config);
            let mut transcript = Transcript::open(&store, &url, Utc::now());
            transcript.greet_if_empty(&mut store);

            let persist = if no_persist { Persist::Skip } else { Persist::Save };
            transcript.append(&mut store, entry, persist);
            println!("{}", transcript.rendered());
        }
        Command::History { url, date } => {
            let store = open_store(&config);
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            match store.load(&TranscriptKey::new(&url, date)) {
                Some(rendered) => println!("{}", rendered),
                None => ::log::info!("No transcript for {} on {}", url, date),
            }
        }
    }
    Ok(())
}

fn open_store(config: &AppConfig) -> TranscriptStore<FileStorage> {
    let store = TranscriptStore::with_prefix(
        FileStorage::new(config.store_path.clone()),
        config.key_prefix.clone(),
    );
    ::log::debug!("Using history file {}", store.storage().path().display());
    store
}

/// Reads the page through WebDriver; connection faults become a failure envelope
async fn extract_live(webdriver_url: &str, url: &str) -> ExtractResponse {
    let mut page = match WebDriverPage::open(webdriver_url, url).await {
        Ok(page) => page,
        Err(e) => return ExtractResponse::failure(e.to_string()),
    };

    let response = match page.fetch().await {
        Ok(snapshot) => handle_request(
            ContentRequest::GetPageText,
            &HtmlDocument::parse(&snapshot.source, snapshot.url),
        ),
        Err(e) => ExtractResponse::failure(e.to_string()),
    };

    if let Err(e) = page.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }
    response
}

async fn watch(config: &AppConfig, url: &str) -> Result<(), Box<dyn Error>> {
    let page = WebDriverPage::open(&config.webdriver_url, url).await?;
    let detector = ChangeDetector::new(config.detector());
    ::log::info!(
        "Watching {} every {:?}",
        url,
        detector.config().interval
    );

    let (tx, mut rx) = mpsc::channel(16);
    let handle = detector.start(page, tx);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                ::log::info!("Interrupted, stopping watcher");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}
