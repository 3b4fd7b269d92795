//! Message formatting utilities for terminal display.

use streamchat_shared::time::timestamp_to_rfc3339;

use crate::{
    dispatcher::DispatchState,
    view::{MessageRow, StreamHeader, StreamView},
};

const SEPARATOR: &str = "============================================================";

/// Width used to right-align the viewer's own messages
pub const DEFAULT_WIDTH: usize = 60;

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the stream header (name, price, description)
    pub fn format_header(header: &StreamHeader) -> String {
        let mut output = String::new();
        output.push_str(SEPARATOR);
        output.push('\n');
        output.push_str(&header.name);
        output.push('\n');
        output.push_str(&header.price);
        output.push('\n');
        if !header.description.is_empty() {
            output.push('\n');
            output.push_str(&header.description);
            output.push('\n');
        }
        output.push_str(SEPARATOR);
        output.push('\n');
        output
    }

    /// Format a single chat row
    ///
    /// Rows written by the viewer are right-aligned to `width` characters,
    /// other rows are left-aligned.
    pub fn format_row(row: &MessageRow, width: usize) -> String {
        if row.reversed {
            format!("{:>width$}\n", row.text, width = width)
        } else {
            format!("{}\n", row.text)
        }
    }

    /// Format the whole page: header, "Live Chat" title and all rows
    pub fn format_view(view: &StreamView, width: usize) -> String {
        let mut output = String::from("\n");
        output.push_str(&Self::format_header(&view.header));
        output.push_str("Live Chat\n\n");
        for row in &view.rows {
            output.push_str(&Self::format_row(row, width));
        }
        output
    }

    /// Format the status line below the chat
    ///
    /// # Arguments
    ///
    /// * `dispatch` - Current state of the message writer
    /// * `unconfirmed` - Sent messages not yet seen in a server snapshot
    /// * `fetched_at` - Unix timestamp of the last successful fetch (milliseconds)
    pub fn format_status(
        dispatch: &DispatchState,
        unconfirmed: usize,
        fetched_at: Option<i64>,
    ) -> String {
        let mut parts = Vec::new();

        let pending = dispatch.queued + usize::from(dispatch.in_flight);
        if pending > 0 {
            parts.push(format!("sending {pending}"));
        }
        if unconfirmed > 0 {
            parts.push(format!("awaiting {unconfirmed}"));
        }
        if let Some(error) = &dispatch.last_error {
            parts.push(format!("last send failed: {error}"));
        }
        match fetched_at.and_then(timestamp_to_rfc3339) {
            Some(synced) => parts.push(format!("synced at {synced}")),
            None => parts.push("not synced yet".to_string()),
        }

        format!("[{}]\n", parts.join(" | "))
    }
}
