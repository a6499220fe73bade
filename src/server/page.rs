//! Channel directory page

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::channel::ChannelList;
use crate::stats::ServerStats;

/// Escape text for HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the directory: current channel, viewer count, one link per channel
pub fn render_directory(stats: &ServerStats, channels: &ChannelList) -> String {
    let current = stats.current_channel.as_deref().unwrap_or("none");

    let mut items = String::new();
    for name in channels.iter() {
        let _ = write!(
            items,
            r#"<li><a href="/chan/{}">{}</a></li>"#,
            utf8_percent_encode(name, NON_ALPHANUMERIC),
            escape_html(name)
        );
    }

    format!(
        r#"<!DOCTYPE html><html><body><h1>Channels</h1>
<p>Watch the <a href="/cur">current channel</a> ({}) - {} viewers.</p>
<ul>{}</ul></body></html>"#,
        escape_html(current),
        stats.viewers,
        items
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_directory() {
        let stats = ServerStats {
            current_channel: Some("news".into()),
            viewers: 3,
            ..Default::default()
        };
        let channels = ChannelList::from_names(["news", "Sports & More"]);

        let html = render_directory(&stats, &channels);

        assert!(html.contains("(news) - 3 viewers."));
        assert!(html.contains(r#"<a href="/chan/news">news</a>"#));
        assert!(html.contains(r#"<a href="/chan/Sports%20%26%20More">Sports &amp; More</a>"#));
    }
}
