// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP collaborators for the Parley chat core.
//!
//! [`HttpTransport`] streams hosted chat and hosted plugin chat replies.
//! [`HttpEndpoints`] covers web ingestion, plugin detection, file extraction,
//! and retrieval. Both share one [`HostedClient`].

pub mod client;
pub mod endpoints;
pub mod stream;
pub mod transport;
pub mod types;

pub use client::HostedClient;
pub use endpoints::HttpEndpoints;
pub use stream::FINISH_REASON_HEADER;
pub use transport::HttpTransport;
