//! Browsing-context platform for authorization windows.
//!
//! The provider's consent page runs in a browsing context Conduit does not
//! control. The only capabilities the connection flow relies on are opening
//! such a context and asking whether it has been closed:
//!
//! - [`BrowsingPlatform::open`] - open a window, or `None` if the platform refused
//! - [`BrowsingPlatform::is_closed`] - poll for closure
//! - [`BrowsingPlatform::close`] - release the window when an attempt ends
//!
//! [`SystemBrowser`] is the desktop implementation: it launches the default
//! browser and learns about closure from whoever drives it (see
//! [`SystemBrowser::mark_closed`]).

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

// ============================================================================
// Authorization URL
// ============================================================================

/// URL of a provider's consent page.
///
/// The value comes from the server and is only ever handed to a browsing
/// context; it is never evaluated. Only `http` and `https` URLs are accepted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationUrl(Url);

impl AuthorizationUrl {
    /// Parses and validates a URL returned by the authorize endpoint.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|e| format!("invalid authorization URL: {e}"))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(format!("unsupported authorization URL scheme: {other}")),
        }
    }

    /// Returns the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host of the consent page.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }
}

impl fmt::Debug for AuthorizationUrl {
    // The query carries the OAuth state token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuthorizationUrl({}://{}{})",
            self.0.scheme(),
            self.0.host_str().unwrap_or_default(),
            self.0.path()
        )
    }
}

impl fmt::Display for AuthorizationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Platform Trait
// ============================================================================

/// Opaque handle to an open browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

impl WindowHandle {
    /// Creates a handle from a platform-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the platform-assigned id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Parameters for opening an authorization window.
#[derive(Debug, Clone)]
pub struct WindowRequest<'a> {
    /// Page to open.
    pub url: &'a AuthorizationUrl,
    /// Window title, e.g. `HubSpot Authorization`.
    pub title: String,
    /// Requested width in pixels.
    pub width: u32,
    /// Requested height in pixels.
    pub height: u32,
}

impl<'a> WindowRequest<'a> {
    /// Creates a 600x600 window request.
    pub fn new(url: &'a AuthorizationUrl, title: impl Into<String>) -> Self {
        Self {
            url,
            title: title.into(),
            width: 600,
            height: 600,
        }
    }
}

/// Capability to open and observe browsing contexts.
pub trait BrowsingPlatform: Send + Sync {
    /// Opens a window, returning `None` if the platform refused (e.g. blocked).
    fn open(&self, request: &WindowRequest<'_>) -> Option<WindowHandle>;

    /// Returns true once the window has been closed, by the user or by the
    /// provider's callback page.
    fn is_closed(&self, handle: WindowHandle) -> bool;

    /// Closes the window if it is still open. Best effort.
    fn close(&self, handle: WindowHandle);
}

// ============================================================================
// System Browser
// ============================================================================

/// Notification sent when [`SystemBrowser`] opens a window.
#[derive(Debug, Clone)]
pub struct OpenedWindow {
    /// Handle of the new window.
    pub handle: WindowHandle,
    /// Page that was opened.
    pub url: String,
    /// Requested window title.
    pub title: String,
}

/// Opens authorization pages in the system's default browser.
///
/// A browser tab cannot report its own closure back to this process, so the
/// window counts as open until [`SystemBrowser::mark_closed`] is called or
/// the connection flow closes it.
pub struct SystemBrowser {
    next_id: AtomicU64,
    open_windows: Mutex<HashSet<u64>>,
    opened_tx: Option<mpsc::UnboundedSender<OpenedWindow>>,
    launch: bool,
}

impl SystemBrowser {
    /// Creates a platform that launches the default browser.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open_windows: Mutex::new(HashSet::new()),
            opened_tx: None,
            launch: true,
        }
    }

    /// Creates a platform that also reports every opened window on a channel.
    pub fn with_open_notifications() -> (Self, mpsc::UnboundedReceiver<OpenedWindow>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let browser = Self {
            opened_tx: Some(tx),
            ..Self::new()
        };
        (browser, rx)
    }

    /// Skips launching the browser; the page must be opened by hand.
    #[must_use]
    pub fn without_launch(mut self) -> Self {
        self.launch = false;
        self
    }

    /// Records that the user closed the window.
    pub fn mark_closed(&self, handle: WindowHandle) {
        let removed = self.windows().remove(&handle.id());
        debug!(handle = handle.id(), removed, "Window marked closed");
    }

    /// Returns the number of windows still considered open.
    pub fn open_count(&self) -> usize {
        self.windows().len()
    }

    fn windows(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.open_windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowsingPlatform for SystemBrowser {
    fn open(&self, request: &WindowRequest<'_>) -> Option<WindowHandle> {
        if self.launch {
            if let Err(e) = open::that(request.url.as_str()) {
                warn!(error = %e, title = %request.title, "Failed to open browser");
                return None;
            }
        }

        let handle = WindowHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.windows().insert(handle.id());
        debug!(handle = handle.id(), host = ?request.url.host(), "Authorization window opened");

        if let Some(tx) = &self.opened_tx {
            // Nobody listening is fine.
            let _ = tx.send(OpenedWindow {
                handle,
                url: request.url.as_str().to_string(),
                title: request.title.clone(),
            });
        }

        Some(handle)
    }

    fn is_closed(&self, handle: WindowHandle) -> bool {
        !self.windows().contains(&handle.id())
    }

    fn close(&self, handle: WindowHandle) {
        self.windows().remove(&handle.id());
    }
}

// ============================================================================
// Tests
// ============================================================================
