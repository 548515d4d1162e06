use std::time::{Duration, Instant};

/// Toasts close themselves after this long.
pub const AUTO_CLOSE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub created_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= AUTO_CLOSE
    }
}

/// Newest-first queue of transient messages.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(ToastKind::Success, message.into(), Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(ToastKind::Error, message.into(), Instant::now());
    }

    pub fn push_at(&mut self, kind: ToastKind, message: String, created_at: Instant) {
        match kind {
            ToastKind::Success => tracing::info!("toast: {}", message),
            ToastKind::Error => tracing::warn!("toast: {}", message),
        }
        self.items.insert(
            0,
            Toast {
                kind,
                message,
                created_at,
            },
        );
    }

    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|t| !t.is_expired(now));
    }

    pub fn current(&self) -> Option<&Toast> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_expiry() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        toasts.push_at(ToastKind::Success, "saved".to_string(), start);
        toasts.push_at(
            ToastKind::Error,
            "failed".to_string(),
            start + Duration::from_millis(2000),
        );

        assert_eq!(toasts.current().unwrap().message, "failed");

        toasts.prune(start + Duration::from_millis(3500));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.current().unwrap().kind, ToastKind::Error);

        toasts.prune(start + Duration::from_millis(5000));
        assert!(toasts.is_empty());
    }
}
