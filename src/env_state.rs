//! # msiskit environment state
//!
//! This module defines [`crate::env_state::MsisEnv`], the **network environment** used by the
//! driver store when the space weather file has to be fetched. It wraps a persistent
//! [`ureq::Agent`] configured with a global timeout, and knows how to resolve `file://`
//! URLs locally so offline mirrors (and tests) never touch the network.
//!
//! ## Structure
//!
//! ```text
//! MsisEnv
//! └── http_client  (ureq::Agent)
//! ```
//!
//! ## Notes
//!
//! - The agent is cheap to clone and is shared by every download performed by a store.
//! - No retry policy is applied: a failed request surfaces as [`MsisError::Transport`]
//!   with the underlying cause attached.
use std::{fmt::Debug, fs, time::Duration};

use ureq::Agent;

use crate::msis_errors::MsisError;

/// Upper bound on the size of a downloaded space weather file
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Network access used by the driver store.
///
/// # Fields
///
/// * `http_client` - A ureq agent used to make HTTP requests
#[derive(Debug, Clone)]
pub struct MsisEnv {
    pub http_client: Agent,
}

impl Default for MsisEnv {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl MsisEnv {
    /// Create a new environment
    ///
    /// Arguments
    /// ---------
    /// * `timeout`: global timeout applied to every request of the agent
    ///
    /// Return
    /// ------
    /// * A new environment with a freshly configured HTTP agent
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent: Agent = config.into();

        MsisEnv { http_client: agent }
    }

    /// Fetch the raw bytes behind `url`.
    ///
    /// `file://` URLs are read from the local filesystem, anything else goes through
    /// the HTTP agent.
    ///
    /// Arguments
    /// ---------
    /// * `url`: the resource to fetch
    ///
    /// Return
    /// ------
    /// * the body of the resource, verbatim
    pub(crate) fn get_bytes_from_url(&self, url: &str) -> Result<Vec<u8>, MsisError> {
        if let Some(local_path) = url.strip_prefix("file://") {
            return Ok(fs::read(local_path)?);
        }

        let transport = |source: ureq::Error| MsisError::Transport {
            url: url.to_string(),
            source,
        };

        self.http_client
            .get(url)
            .call()
            .map_err(transport)?
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(transport)
    }
}
