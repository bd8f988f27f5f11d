//! Finite view state: toasts, confirmation modals, in-flight submit guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Toast flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Toast {
    #[default]
    Idle,
    Visible { message: String, kind: ToastKind },
}

/// Events that drive a [`Toast`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastAction {
    Show { message: String, kind: ToastKind },
    Dismiss,
}

impl Toast {
    pub fn dispatch(&mut self, action: ToastAction) {
        *self = match action {
            ToastAction::Show { message, kind } => Toast::Visible { message, kind },
            ToastAction::Dismiss => Toast::Idle,
        };
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.dispatch(ToastAction::Show {
            message: message.into(),
            kind: ToastKind::Success,
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.dispatch(ToastAction::Show {
            message: message.into(),
            kind: ToastKind::Error,
        });
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Toast::Visible { message, .. } => Some(message),
            Toast::Idle => None,
        }
    }

    pub fn kind(&self) -> Option<ToastKind> {
        match self {
            Toast::Visible { kind, .. } => Some(*kind),
            Toast::Idle => None,
        }
    }
}

/// Blocking confirmation for a destructive action on `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmModal<T> {
    Idle,
    Pending { target: T, label: String },
}

impl<T> Default for ConfirmModal<T> {
    fn default() -> Self {
        ConfirmModal::Idle
    }
}

impl<T> ConfirmModal<T> {
    /// Open the modal. A second request replaces the first.
    pub fn request(&mut self, target: T, label: impl Into<String>) {
        *self = ConfirmModal::Pending {
            target,
            label: label.into(),
        };
    }

    pub fn cancel(&mut self) {
        *self = ConfirmModal::Idle;
    }

    /// Close the modal and hand back the confirmed target.
    pub fn confirm(&mut self) -> Option<T> {
        match std::mem::take(self) {
            ConfirmModal::Pending { target, .. } => Some(target),
            ConfirmModal::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ConfirmModal::Pending { .. })
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ConfirmModal::Pending { label, .. } => Some(label),
            ConfirmModal::Idle => None,
        }
    }
}

/// Disables a submit control while a request is in flight.
#[derive(Debug, Clone, Default)]
pub struct SubmitGate {
    in_flight: Arc<AtomicBool>,
}

/// Held for the duration of one submission; dropping it re-enables submit.
#[derive(Debug)]
pub struct SubmitTicket {
    in_flight: Arc<AtomicBool>,
}

impl SubmitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another submission holds a ticket.
    pub fn try_begin(&self) -> Option<SubmitTicket> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitTicket {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
