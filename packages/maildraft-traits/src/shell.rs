/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Services provided by the embedding shell. Injected at the composition
/// root so notification routing has an owner with the same lifecycle as
/// the editor session, rather than living in process-wide static state.
pub trait ShellProvider: Send + Sync + 'static {
    fn request_redraw(&self) {}
    fn notify(&self, toast: Toast) {
        let _ = toast;
    }
}

pub struct DummyShellProvider;
impl ShellProvider for DummyShellProvider {}
