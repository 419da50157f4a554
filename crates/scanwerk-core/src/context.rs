// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Explicitly injected context: authentication token and device class.
// Components that need either receive it as a parameter; nothing reads it
// from ambient global state.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::Result;

/// Token file inside the data directory.
const TOKEN_FILE: &str = "auth_token";

/// Screens narrower than this are treated as mobile.
const MOBILE_MAX_WIDTH: u32 = 768;

const MOBILE_UA_TOKENS: &[&str] = &[
    "android",
    "iphone",
    "ipad",
    "ipod",
    "mobile",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Bearer token for the gateway, persisted in the data directory.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Option<String>,
    /// Where the token is persisted; `None` keeps it in memory only.
    store_path: Option<PathBuf>,
}

impl AuthContext {
    /// In-memory context with no persistence.
    pub fn in_memory(token: Option<String>) -> Self {
        Self {
            token,
            store_path: None,
        }
    }

    /// Load the persisted token (if any) from `data_dir`.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(TOKEN_FILE);
        let token = std::fs::read_to_string(&path)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        debug!(has_token = token.is_some(), "auth context loaded");
        Self {
            token,
            store_path: Some(path),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Set and persist a new token.
    pub fn store(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if let Some(ref path) = self.store_path {
            std::fs::write(path, &token)?;
        }
        self.token = Some(token);
        info!("auth token stored");
        Ok(())
    }

    /// Forget the token and remove the persisted copy.
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        if let Some(ref path) = self.store_path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        info!("auth token cleared");
        Ok(())
    }

    /// Drop the in-memory token. The persisted copy stays for the next run.
    pub fn release(&mut self) {
        if self.token.take().is_some() {
            debug!("auth token released");
        }
    }
}

/// Device class, derived once from the user agent and screen width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceContext {
    pub is_mobile: bool,
    pub screen_width: u32,
}

impl DeviceContext {
    pub fn detect(user_agent: &str, screen_width: u32) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let ua_mobile = MOBILE_UA_TOKENS.iter().any(|token| ua.contains(token));
        Self {
            is_mobile: ua_mobile || screen_width < MOBILE_MAX_WIDTH,
            screen_width,
        }
    }

    /// Desktop context for headless use.
    pub fn desktop() -> Self {
        Self {
            is_mobile: false,
            screen_width: 1920,
        }
    }
}

/// Everything a component may need, passed explicitly.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub auth: AuthContext,
    pub device: DeviceContext,
}

impl AppContext {
    pub fn new(config: AppConfig, auth: AuthContext, device: DeviceContext) -> Self {
        Self {
            config,
            auth,
            device,
        }
    }

    /// Load config and token from `data_dir`.
    pub fn init(data_dir: &Path, device: DeviceContext) -> Self {
        Self::new(AppConfig::load(data_dir), AuthContext::load(data_dir), device)
    }

    /// Release in-memory session state at the end of a run. Persisted
    /// credentials are left alone; see [`AppContext::logout`].
    pub fn teardown(&mut self) {
        self.auth.release();
    }

    /// Sign out: forget the token and delete its persisted copy.
    pub fn logout(&mut self) -> Result<()> {
        self.auth.clear()
    }
}
