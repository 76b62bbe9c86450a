//! Alert mail rendering and the mail-backed [`Notifier`].

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use pricewatch_core::BestOffer;

use super::{Notifier, NotifyFuture};

/// A rendered alert message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMail {
    pub subject: String,
    pub html: String,
    /// Plain-text alternative for clients that do not render HTML.
    pub text: String,
}

impl AlertMail {
    /// Renders one message covering every offer, in the given order.
    #[must_use]
    pub fn render(offers: &[BestOffer], at: DateTime<Utc>) -> Self {
        let ts = at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        Self {
            subject: subject(offers),
            html: html_body(offers, &ts),
            text: text_body(offers, &ts),
        }
    }
}

fn subject(offers: &[BestOffer]) -> String {
    let parts: Vec<String> = offers
        .iter()
        .map(|o| format!("{} £{:.0} @ {}", o.model, o.price_num.trunc(), o.site))
        .collect();
    format!("Deals: {}", parts.join(" | "))
}

fn html_body(offers: &[BestOffer], ts: &str) -> String {
    let mut rows = String::new();
    for o in offers {
        let link = o
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!(r#"<a href="{}" target="_blank">link</a>"#, escape_html(u)))
            .unwrap_or_default();
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>£{:.2}</td><td>{}</td><td>{}</td><td>{link}</td></tr>",
            escape_html(&o.model),
            o.price_num,
            escape_html(&o.site),
            escape_html(o.title.as_deref().unwrap_or_default()),
        );
    }

    format!(
        r#"<html><body>
<p><b>Price alerts</b> · {ts} · <i>in stock only</i></p>
<table border="1" cellspacing="0" cellpadding="6">
<thead><tr><th>Model</th><th>Price</th><th>Site</th><th>Title</th><th>URL</th></tr></thead>
<tbody>{rows}</tbody>
</table>
</body></html>"#
    )
}

fn text_body(offers: &[BestOffer], ts: &str) -> String {
    let mut text = format!("Price alerts · {ts} · in stock only\n\n");
    for o in offers {
        let _ = writeln!(text, "{}  £{:.2}  {}", o.model, o.price_num, o.site);
        if let Some(title) = o.title.as_deref().filter(|t| !t.is_empty()) {
            let _ = writeln!(text, "  {title}");
        }
        if let Some(url) = o.url.as_deref().filter(|u| !u.is_empty()) {
            let _ = writeln!(text, "  {url}");
        }
    }
    text
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Delivers a rendered [`AlertMail`].
pub trait MailTransport: Send + Sync {
    fn send<'a>(&'a self, mail: &'a AlertMail) -> NotifyFuture<'a>;
}

/// [`Notifier`] that renders an [`AlertMail`] and sends it through `T`.
#[derive(Debug, Clone)]
pub struct MailNotifier<T> {
    transport: T,
}

impl<T: MailTransport> MailNotifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: MailTransport> Notifier for MailNotifier<T> {
    fn notify<'a>(&'a self, offers: &'a [BestOffer]) -> NotifyFuture<'a> {
        Box::pin(async move {
            if offers.is_empty() {
                return Ok(());
            }
            let mail = AlertMail::render(offers, Utc::now());
            self.transport.send(&mail).await?;
            tracing::info!(
                offers = offers.len(),
                subject = %mail.subject,
                "price alert sent"
            );
            Ok(())
        })
    }
}
