//! Page tools against a simulated browser.
//!
//! Demonstrates:
//! - Wiring the background and a content script onto one bus
//! - Raw tab messages and their JSON wire shape
//! - Popup commands that stay local (links, page info)
//! - Rejection of an action the receiver does not handle
//!
//! Usage:
//!   cargo run --example page_tools
//!   cargo run --example page_tools -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Context;
use page_relay::dom::{Document, Element};
use page_relay::{
    ActionKind, ApiClient, Background, ContentScript, ContextKind, MessageBus, MessageSender, Popup,
    RelayOptions, Request, SimulatedBrowser,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== Page Tools ===\n");

    let options = RelayOptions::new();
    options.validate().context("relay options")?;

    let browser = SimulatedBrowser::new();
    let bus = MessageBus::new(&options);
    Background::new(Arc::new(browser.clone()), bus.clone(), options.capture).start();

    let tab = browser.open_tab(sample_page()?);
    let document = browser
        .document(tab)
        .context("simulated tab has no document")?;
    ContentScript::new(tab, document, bus.clone()).start();
    println!("[OK] Opened tab {tab} with a content script\n");

    // Raw tab messages
    let popup_sender = MessageSender::new(ContextKind::Popup);
    for action in [
        ActionKind::GetPageContent,
        ActionKind::GetPageInfo,
        ActionKind::GetDivText,
    ] {
        let response = bus
            .send_tab_message(popup_sender, tab, Request::new(action))
            .await
            .with_context(|| format!("{action} request"))?;
        println!("--- {action} ---");
        println!("{}\n", serde_json::to_string_pretty(&response.to_value()?)?);
    }

    // Tab info lives in the background, not the content script
    let rejected = bus
        .send_tab_message(popup_sender, tab, Request::new(ActionKind::GetTabInfo))
        .await?;
    println!("--- getTabInfo sent to the tab ---");
    println!("{}\n", rejected.to_value()?);

    // Popup commands that need no backend
    let api = ApiClient::new(&options).context("api client")?;
    let mut popup = Popup::new(bus.clone(), Arc::new(browser.clone()), api);
    popup.extract_links().await;
    popup.page_info().await;

    println!("--- Popup transcript ---");
    for message in popup.transcript() {
        println!("[{:?}] {}\n", message.role, message.text);
    }

    println!("=== Done ===");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "page_relay=debug"
    } else {
        "page_relay=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn sample_page() -> anyhow::Result<Document> {
    let root = Element::new("html").attr("lang", "en").children([
        Element::new("head").children([
            Element::new("title").text("Field Notes"),
            Element::new("meta")
                .attr("name", "description")
                .attr("content", "Weekly notes from the field"),
            Element::new("meta")
                .attr("name", "viewport")
                .attr("content", "width=device-width"),
        ]),
        Element::new("body").children([
            Element::new("nav").child(Element::new("a").attr("href", "/").text("Home")),
            Element::new("article").children([
                Element::new("h1").text("Week 12"),
                Element::new("p").text("Rain all week. The river rose two metres."),
                Element::new("h2").text("Sightings"),
                Element::new("p").text("Herons at dawn, otters at dusk."),
                Element::new("a")
                    .attr("href", "https://birds.example/heron")
                    .text("Heron guide"),
                Element::new("a")
                    .attr("href", "https://birds.example/otter")
                    .attr("title", "Otter guide"),
                Element::new("a")
                    .attr("href", "https://maps.example/river")
                    .text("River map"),
            ]),
            Element::new("div").id("aditya").text("Legacy panel"),
            Element::new("footer").text("Copyright"),
        ]),
    ]);
    Ok(Document::new("https://notes.example/week-12", root)?)
}
