//! Outgoing HTTP for the static scrape tier.
//!
//! Page fetches go through the [`HttpClient`] trait so scraping logic can be
//! exercised against canned responses instead of the network.

mod client;

pub use client::{FetchError, HttpClient, MockClient, WebClient, WebClientBuilder};
pub(crate) use client::USER_AGENT;
