//! User-facing notices emitted by the cart store.
//!
//! Notices are fire-and-forget: a notifier never influences what the store
//! does. The front end decides how to present them (toast, status line, ...).

use std::sync::{Arc, Mutex, PoisonError};

/// A success or failure signal for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// A product was added (or its amount incremented).
    ProductAdded,
    /// Adding failed for a reason other than stock.
    AddFailed,
    /// The requested amount exceeds available stock.
    StockExceeded,
    /// The product to remove is not in the cart, or removal failed.
    RemoveFailed,
    /// A quantity below 1 was requested.
    InvalidQuantity,
    /// Updating the amount failed for a reason other than stock or quantity.
    UpdateFailed,
}

impl Notice {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::ProductAdded)
    }

    /// Default message shown to the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ProductAdded => "Product added!",
            Self::AddFailed => "Could not add the product",
            Self::StockExceeded => "Requested quantity is out of stock",
            Self::RemoveFailed => "Could not remove the product",
            Self::InvalidQuantity => "Invalid product quantity",
            Self::UpdateFailed => "Could not change the product quantity",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Receiver of cart notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Sends notices to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(notice = ?notice, "{notice}");
        } else {
            tracing::info!(notice = ?notice, "{notice}");
        }
    }
}

/// Keeps every notice, in order, for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent notice, if any.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }

    /// Remove and return all notices.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
