use crate::api::ApiClient;
use crate::message::Role;
use crate::query::{MessageCache, SubmitTracker};

/// One entry of the rendered conversation, in display order. A pure function
/// of the cache and tracker state; the terminal never feeds back into it.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow {
    /// A message the backend has persisted.
    Message { role: Role, content: String },
    /// Transient echo of the submitted text while it is pending or failed.
    Echo(String),
    /// Busy indicator for the outstanding submission.
    Busy,
    /// A read or write failure, rendered inline.
    Error(String),
}

pub struct App {
    // Core state
    pub should_quit: bool,

    // Input box state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat viewport state
    pub scroll: u16,
    pub chat_height: u16, // inner size, updated during render
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Session-scoped orchestration: exactly one cache and one tracker per
    // chat session, handed by reference to the input handler and the
    // renderer rather than looked up ambiently.
    pub api: ApiClient,
    pub cache: MessageCache,
    pub tracker: SubmitTracker,
}

impl App {
    pub fn new(base_url: &str) -> Self {
        Self {
            should_quit: false,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            api: ApiClient::new(base_url),
            cache: MessageCache::new(),
            tracker: SubmitTracker::new(),
        }
    }

    /// Whether the submission surface is disabled.
    pub fn is_busy(&self) -> bool {
        self.tracker.is_pending()
    }

    /// Submit the current input. Clears the input immediately rather than
    /// waiting for the server; the tracker keeps the text for the echo.
    /// Ignored while a submission is pending or when the input is empty.
    pub fn submit(&mut self) {
        if self.input.is_empty() || self.tracker.is_pending() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.tracker.trigger(text, &self.api);
        self.scroll_to_bottom();
    }

    /// Drop the cached conversation and fetch it again. This is the manual
    /// refresh path; it is also how a parked read error gets cleared.
    pub fn refresh(&mut self) {
        self.cache.invalidate();
        self.cache.ensure(&self.api);
    }

    /// Drive the outstanding network work. Called from the event loop tick;
    /// never blocks.
    pub async fn poll(&mut self) {
        let was_fetching = self.cache.is_fetching();

        self.tracker.poll(&mut self.cache).await;
        self.cache.ensure(&self.api);
        self.cache.poll().await;

        if was_fetching && !self.cache.is_fetching() && self.cache.messages().is_some() {
            self.scroll_to_bottom();
        }
    }

    /// The conversation as it should be rendered, top to bottom: every
    /// cached message, the read error if the fetch failed, then the echo of
    /// an in-flight or failed submission, the busy indicator, and the write
    /// error.
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        let mut rows = Vec::new();

        if let Some(messages) = self.cache.messages() {
            for message in messages {
                rows.push(DisplayRow::Message {
                    role: message.role,
                    content: message.content.clone(),
                });
            }
        }

        if let Some(err) = self.cache.error() {
            rows.push(DisplayRow::Error(err.to_string()));
        }

        if self.tracker.is_pending() || self.tracker.error().is_some() {
            if let Some(text) = self.tracker.input() {
                rows.push(DisplayRow::Echo(text.to_string()));
            }
        }

        if self.tracker.is_pending() {
            rows.push(DisplayRow::Busy);
        }

        if let Some(err) = self.tracker.error() {
            rows.push(DisplayRow::Error(err.to_string()));
        }

        rows
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.tracker.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.scroll < max_scroll {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        self.scroll = (self.scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.scroll = self.scroll.saturating_sub(half_page);
    }

    /// Scroll so the newest row (and the busy indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        let total_lines = self.total_chat_lines();
        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        }
    }

    /// Count the lines the chat occupies once wrapped, mirroring how the
    /// renderer lays rows out: a role line, the wrapped content, and a blank
    /// separator per row.
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for row in self.display_rows() {
            match row {
                DisplayRow::Message { content, .. }
                | DisplayRow::Echo(content)
                | DisplayRow::Error(content) => {
                    total_lines += 1; // Role line ("You:", "AI:", "Error:")
                    for line in content.lines() {
                        // Character count, not byte length, for UTF-8 content
                        let char_count = line.chars().count();
                        if char_count == 0 {
                            total_lines += 1;
                        } else {
                            total_lines += ((char_count / wrap_width) + 1) as u16;
                        }
                    }
                    total_lines += 1; // Blank line after the row
                }
                DisplayRow::Busy => {
                    total_lines += 2; // "AI:" + animated ellipsis
                }
            }
        }

        total_lines
    }
}
