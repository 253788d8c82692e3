use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tracing::{debug, error};

use codesense_core::export::write_export;
use codesense_core::{
    spawn_analysis, Completion, Config, Error, Resolution, ReviewClient, SelectedFile, Session,
    SessionState,
};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One-line message shown under the session status until the next action.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // File path input
    pub path_input: String,
    pub path_cursor: usize, // cursor position in path_input (chars)

    // Analysis
    pub session: Session,
    pub client: Arc<ReviewClient>,
    pub notice: Option<Notice>,
    in_flight: Option<AbortHandle>,

    // Report scrolling
    pub report_scroll: u16,
    pub report_height: u16,
    pub total_report_lines: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        let client = Arc::new(ReviewClient::new(&config.endpoint));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            path_input: String::new(),
            path_cursor: 0,

            session: Session::new(),
            client,
            notice: None,
            in_flight: None,

            report_scroll: 0,
            report_height: 0,
            total_report_lines: 0,

            animation_frame: 0,

            config,
        }
    }

    /// Read the file named in the path input and make it the session's file.
    pub async fn select_path(&mut self) {
        let raw = self.path_input.trim();
        if raw.is_empty() {
            self.notice = Some(Notice::new(NoticeLevel::Warning, "Enter a path to a code file."));
            return;
        }

        let path = PathBuf::from(raw);
        match SelectedFile::load(&path).await {
            Ok(file) => {
                self.notice = if file.is_supported_source() {
                    None
                } else {
                    Some(Notice::new(
                        NoticeLevel::Warning,
                        format!(
                            "{} is not a .py/.js/.java/.ts/.cpp/.c file; the service may reject it.",
                            file.name
                        ),
                    ))
                };
                self.cancel_in_flight();
                self.session.select_file(file);
                self.report_scroll = 0;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read selected file");
                self.notice = Some(Notice::new(
                    NoticeLevel::Error,
                    format!("Could not read {}: {}", path.display(), e),
                ));
            }
        }
    }

    /// Submit the selected file. The result comes back as `AppEvent::Analysis`.
    pub fn analyze(&mut self, tx: UnboundedSender<AppEvent>) {
        let submission = match self.session.submit() {
            Ok(submission) => submission,
            Err(Error::Validation(msg)) => {
                self.notice = Some(Notice::new(NoticeLevel::Warning, msg));
                return;
            }
            Err(e) => {
                // Double submit and friends are ignored
                debug!(error = %e, "analyze ignored");
                return;
            }
        };

        self.notice = None;
        self.animation_frame = 0;
        let generation = submission.generation;
        let handle = spawn_analysis(Arc::clone(&self.client), submission);
        self.in_flight = Some(handle.abort_handle());

        tokio::spawn(async move {
            let completion = match handle.await {
                Ok(completion) => completion,
                Err(e) if e.is_cancelled() => {
                    debug!(generation, "analysis request cancelled");
                    return;
                }
                Err(e) => Completion {
                    generation,
                    result: Err(Error::Transport(format!("analysis task failed: {}", e))),
                },
            };
            let _ = tx.send(AppEvent::Analysis(completion));
        });
    }

    pub fn on_analysis(&mut self, completion: Completion) {
        if self.session.complete(completion) == Resolution::Applied {
            self.in_flight = None;
            self.report_scroll = 0;
        }
    }

    /// Drop the outstanding request, if any. Its completion never arrives.
    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    /// Back from a failure to the same file, ready to submit again.
    pub fn retry(&mut self) {
        match self.session.retry() {
            Ok(()) => self.notice = None,
            Err(e) => debug!(error = %e, "retry ignored"),
        }
    }

    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.session.reset();
        self.path_input.clear();
        self.path_cursor = 0;
        self.notice = None;
        self.report_scroll = 0;
        self.total_report_lines = 0;
    }

    pub fn export(&mut self) {
        let SessionState::Succeeded { file, record } = self.session.state() else {
            self.notice = Some(Notice::new(
                NoticeLevel::Warning,
                "Nothing to export yet. Analyze a file first.",
            ));
            return;
        };

        self.notice = Some(
            match write_export(&self.config.export_dir(), &file.name, record, self.config.export) {
                Ok(path) => Notice::new(NoticeLevel::Info, format!("Report exported to {}", path.display())),
                Err(e) => {
                    error!(error = %format!("{:#}", e), "export failed");
                    Notice::new(NoticeLevel::Error, format!("Export failed: {:#}", e))
                }
            },
        );
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.state().is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Report scrolling
    pub fn scroll_down(&mut self) {
        if self.report_scroll < self.max_scroll() {
            self.report_scroll = self.report_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.report_scroll = self.report_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.report_height / 2;
        self.report_scroll = (self.report_scroll + half_page).min(self.max_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.report_height / 2;
        self.report_scroll = self.report_scroll.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.report_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.report_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        self.total_report_lines.saturating_sub(self.report_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn app() -> App {
        App::new(Config::new())
    }

    #[tokio::test]
    async fn test_select_path_loads_file() {
        let mut src = tempfile::Builder::new().suffix(".py").tempfile().unwrap();
        writeln!(src, "print('hi')").unwrap();

        let mut app = app();
        app.path_input = src.path().display().to_string();
        app.select_path().await;

        assert_eq!(app.session.state().label(), "ready");
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn test_select_missing_path_keeps_state() {
        let mut app = app();
        app.path_input = "/definitely/not/here.py".to_string();
        app.select_path().await;

        assert_eq!(app.session.state().label(), "idle");
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_unsupported_extension_warns_but_selects() {
        let src = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let mut app = app();
        app.path_input = src.path().display().to_string();
        app.select_path().await;

        assert_eq!(app.session.state().label(), "ready");
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_analyze_without_file_prompts() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = app();
        app.analyze(tx);

        assert_eq!(app.session.state().label(), "idle");
        assert_eq!(
            app.notice.as_ref().unwrap().text,
            "Please select a code file first."
        );
    }

    #[tokio::test]
    async fn test_reset_cancels_pending_request() {
        // Accepts connections but never answers, so only an abort ends the request
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = Config::new();
        config.endpoint = format!("http://{}/analyze", listener.local_addr().unwrap());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(config);
        app.session.select_file(SelectedFile::new("main.py", "x = 1"));
        app.analyze(tx);
        assert!(app.session.state().is_pending());

        let aborted = app.in_flight.clone().unwrap();
        app.reset();
        assert!(app.in_flight.is_none());
        assert_eq!(app.session.state().label(), "idle");

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !aborted.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("request still running after reset");

        // The forwarding task exits without reporting anything
        let next = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv()).await;
        assert!(!matches!(next, Ok(Some(AppEvent::Analysis(_)))));
        drop(listener);
    }

    #[test]
    fn test_export_without_review_warns() {
        let mut app = app();
        app.export();
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn test_reset_clears_input() {
        let mut app = app();
        app.session.select_file(SelectedFile::new("main.py", "x = 1"));
        app.path_input = "main.py".to_string();
        app.path_cursor = 7;
        app.reset();

        assert_eq!(app.session.state().label(), "idle");
        assert!(app.path_input.is_empty());
        assert_eq!(app.path_cursor, 0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app();
        app.total_report_lines = 30;
        app.report_height = 10;
        app.scroll_to_bottom();
        assert_eq!(app.report_scroll, 20);
        app.scroll_down();
        assert_eq!(app.report_scroll, 20);
        app.scroll_half_page_up();
        assert_eq!(app.report_scroll, 15);
    }
}
