//! Plain-text rendering for the CLI.

use crate::inspect::FilePreview;
use crate::timer::{Frame, Phase};
use crate::tree::TreeNode;

/// Shown when an archive opened fine but yielded no nodes.
pub const EMPTY_ARCHIVE_MESSAGE: &str = "archive is empty or unsupported format";

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Draw a tree with box-drawing guides, folders suffixed with `/`.
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    draw(nodes, "", &mut out);
    out
}

fn draw(nodes: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        if node.is_dir {
            out.push_str(&format!("{}{}{}/\n", prefix, branch, node.name));
        } else {
            out.push_str(&format!(
                "{}{}{} ({})\n",
                prefix,
                branch,
                node.name,
                format_size(node.size)
            ));
        }
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        draw(&node.children, &child_prefix, out);
    }
}

pub fn render_preview(preview: &FilePreview) -> String {
    let mut out = format!("{} ({})\n", preview.filename, format_size(preview.size));
    match &preview.content {
        Some(content) => {
            out.push_str(content);
            if !content.ends_with('\n') {
                out.push('\n');
            }
            if preview.truncated {
                out.push_str("... (preview truncated)\n");
            }
        }
        None => out.push_str("binary file, no preview available\n"),
    }
    out
}

pub fn render_frame(frame: &Frame) -> String {
    match frame.phase {
        Phase::Stopped => format!("{} (paused)", format_clock(frame.remaining_seconds)),
        Phase::Running => format_clock(frame.remaining_seconds),
        Phase::Expired => format!("{} time is up", format_clock(0)),
    }
}
