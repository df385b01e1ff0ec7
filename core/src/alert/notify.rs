/// Blocking, user-visible notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);

    /// Redraws the alert log panel with the stored text.
    fn show_log(&self, _log: &str) {}
}
