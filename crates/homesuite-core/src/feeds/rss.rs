//! RSS 2.0 channel parsing.

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use super::FeedError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: Option<String>,
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

/// Parse an RSS document. Elements other than the mapped channel and item
/// fields are ignored.
pub fn parse_feed(xml: &str) -> Result<Channel, FeedError> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let mut channel: Option<Channel> = None;
    let mut item: Option<FeedItem> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            FeedError::Xml(format!("{e} at byte {}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"channel" if channel.is_none() => channel = Some(Channel::default()),
                    b"item" if parent_is(&path, b"channel") => item = Some(FeedItem::default()),
                    _ => {}
                }
                path.push(name);
                text.clear();
            }
            Event::Text(t) => {
                let content = t
                    .unescape()
                    .map_err(|e| FeedError::Xml(e.to_string()))?;
                text.push_str(&content);
            }
            Event::CData(c) => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    return Err(FeedError::Xml("unbalanced end tag".to_string()));
                };
                let value = text.trim().to_string();
                text.clear();

                if name == b"item" && parent_is(&path, b"channel") {
                    if let (Some(ch), Some(done)) = (channel.as_mut(), item.take()) {
                        ch.items.push(done);
                    }
                } else if parent_is(&path, b"item") {
                    if let Some(current) = item.as_mut() {
                        set_item_field(current, &name, value);
                    }
                } else if parent_is(&path, b"channel") {
                    if let Some(ch) = channel.as_mut() {
                        set_channel_field(ch, &name, value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(FeedError::Xml("unexpected end of document".to_string()));
    }
    let channel = channel.ok_or_else(|| FeedError::Xml("missing <channel> element".to_string()))?;
    tracing::debug!("Parsed feed {:?} with {} items", channel.title, channel.items.len());
    Ok(channel)
}

fn parent_is(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.last().is_some_and(|last| last.as_slice() == name)
}

fn set_item_field(item: &mut FeedItem, name: &[u8], value: String) {
    match name {
        b"title" => item.title = value,
        b"link" => item.link = value,
        b"description" => item.description = value,
        b"pubDate" => item.pub_date = Some(value),
        b"guid" => item.guid = Some(value),
        _ => {}
    }
}

fn set_channel_field(channel: &mut Channel, name: &[u8], value: String) {
    match name {
        b"title" => channel.title = value,
        b"link" => channel.link = value,
        b"description" => channel.description = value,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Example News</title>
    <link>https://news.example.com/</link>
    <description>Daily &amp; weekly</description>
    <atom:link href="https://news.example.com/rss" rel="self"></atom:link>
    <image><title>logo</title><url>https://news.example.com/logo.png</url></image>
    <item>
      <title>First</title>
      <link>https://news.example.com/1</link>
      <description><![CDATA[<p>Hello</p>]]></description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
      <guid isPermaLink="false">item-1</guid>
    </item>
    <item>
      <title>Second</title>
      <category>misc</category>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn maps_channel_and_items() {
        let channel = parse_feed(FEED).unwrap();
        assert_eq!(channel.title, "Example News");
        assert_eq!(channel.link, "https://news.example.com/");
        assert_eq!(channel.description, "Daily & weekly");
        assert_eq!(channel.items.len(), 2);

        let first = &channel.items[0];
        assert_eq!(first.title, "First");
        assert_eq!(first.description, "<p>Hello</p>");
        assert_eq!(first.pub_date.as_deref(), Some("Mon, 06 Jan 2025 10:00:00 GMT"));
        assert_eq!(first.guid.as_deref(), Some("item-1"));

        let second = &channel.items[1];
        assert_eq!(second.title, "Second");
        assert!(second.link.is_empty());
        assert_eq!(second.pub_date, None);
    }

    #[test]
    fn missing_channel_is_an_error() {
        assert!(matches!(
            parse_feed("<rss version=\"2.0\"></rss>"),
            Err(FeedError::Xml(_))
        ));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_feed("<rss><channel><title>x</channel></rss>").is_err());
        assert!(parse_feed("<rss><channel><title>x</title>").is_err());
    }
}
