//! Selection page markup.
//!
//! Bare-bones HTML: one submission form per visible network. Styling is out
//! of scope; the page only has to work in a captive-portal mini browser.

use super::registry::{AccessPointRegistry, SecurityMode};

/// Static acknowledgment body returned by the submit route.
pub(crate) const ACK_PAGE: &str = "<!doctype html>\
<html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>WiFi Setup</title></head>\
<body><p>Thanks! The device will now try to join the selected network.</p>\
</body></html>";

/// Render the index page listing every known network.
///
/// Each network gets its own form posting back to `submit_route` with the
/// SSID as a hidden field and a passphrase input. SSIDs come off the air, so
/// they are escaped before being embedded.
pub(crate) fn render_index(registry: &AccessPointRegistry, submit_route: &str) -> String {
    let mut out = String::from(
        "<!doctype html>\
         <html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>WiFi Setup</title></head>\
         <body><h1>Choose a network</h1>",
    );

    if registry.is_empty() {
        out.push_str("<p>No networks found.</p>");
    } else {
        for record in registry.records() {
            let ssid = escape_html(&record.ssid);
            let marker = match record.security {
                SecurityMode::Open => "open",
                SecurityMode::Secured => "secured",
            };
            out.push_str(&format!(
                "<form method=\"get\" action=\"{submit}\">\
                 <input type=\"hidden\" name=\"ssid\" value=\"{ssid}\">\
                 {ssid} ({dbm} dBm, {marker}) \
                 <input type=\"password\" name=\"pass\" placeholder=\"passphrase\">\
                 <input type=\"submit\" value=\"Connect\">\
                 </form><hr>",
                submit = submit_route,
                ssid = ssid,
                dbm = record.signal_dbm,
                marker = marker,
            ));
        }
    }

    out.push_str("</body></html>");
    out
}

/// Escape text for embedding in HTML body and attribute positions.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
