//! Server-rendered HTML pages.
//!
//! Every interpolated value goes through `escape_html` (or `css_url` inside
//! style rules). Pages carry their styles inline and no scripts.

use guestdrop_core::models::{Event, EventSummary, UploadLink};

const BASE_STYLE: &str = r#"
html, body { height: 100%; margin: 0; padding: 0; }
body {
  min-height: 100vh;
  color: #fff;
  background: #222;
  font-family: 'Tajawal', 'Cairo', Arial, sans-serif;
  display: flex;
  flex-direction: column;
  justify-content: center;
  align-items: center;
}
.form-box {
  background: rgba(0,0,0,0.75);
  padding: 32px 18px 24px 18px;
  margin: 24px auto;
  border-radius: 18px;
  max-width: 390px;
  width: 95vw;
  box-shadow: 0 4px 16px #0004;
}
.wide { max-width: 760px; }
h2 { font-family: 'Cairo', Arial, sans-serif; font-size: 2em; margin-bottom: 6px; }
.event-place { font-size: 1.1em; margin-bottom: 20px; color: #ffd2e6; }
input { width: 100%; margin-bottom: 15px; box-sizing: border-box; padding: 8px; }
button {
  width: 100%;
  padding: 13px;
  border-radius: 8px;
  border: none;
  font-size: 1.15em;
  background: #fa3b77;
  color: #fff;
  font-weight: bold;
  cursor: pointer;
  margin-top: 10px;
}
button:hover { background: #c80046; }
a { color: #ffd2e6; }
table { width: 100%; border-collapse: collapse; }
td, th { padding: 6px; text-align: left; border-bottom: 1px solid #fff3; }
.qr { background: #fff; padding: 12px; border-radius: 8px; display: inline-block; }
@media (max-width: 500px) {
  .form-box { padding: 16px 5vw 14px 5vw; max-width: 98vw; }
  h2 { font-size: 1.4em; }
}
"#;

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make a URL safe inside a quoted CSS `url('...')` within a `<style>` element.
fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '\\' => out.push_str("%5C"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            c if c.is_whitespace() || c.is_control() => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, extra_style: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>{base}{extra}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        base = BASE_STYLE,
        extra = extra_style,
        body = body,
    )
}

/// Guest upload form for one event, over the event's background image.
pub fn guest_page(event: &Event) -> String {
    let background = format!(
        "body {{ background-image: url('{}'); background-size: cover; \
         background-position: center center; background-repeat: no-repeat; }}",
        css_url(&event.bg)
    );
    let body = format!(
        r#"<div class="form-box">
  <h2>{name}</h2>
  <div class="event-place">{date} | {place}</div>
  <form action="/event/{id}/upload" method="POST" enctype="multipart/form-data">
    <input type="file" name="file" required accept="image/*,video/*" /><br/>
    <button type="submit">Upload</button>
  </form>
</div>"#,
        name = escape_html(&event.name),
        date = escape_html(&event.date),
        place = escape_html(&event.place),
        id = escape_html(&event.id),
    );
    page(&format!("Upload for {}", event.name), &background, &body)
}

/// Confirmation shown after a guest upload.
pub fn upload_success(event_id: &str) -> String {
    let body = format!(
        r#"<div class="form-box">
  <h2>Thank you!</h2>
  <div class="event-place">Your file was uploaded.</div>
  <a href="/event/{id}">Upload another</a>
</div>"#,
        id = escape_html(event_id),
    );
    page("Upload complete", "", &body)
}

/// Organizer console with the create, list and browse forms.
pub fn admin_console() -> String {
    let body = r#"<div class="form-box">
  <h2>Create event</h2>
  <form action="/admin/create" method="POST" enctype="multipart/form-data">
    <input type="text" name="eventName" placeholder="Event name" required />
    <input type="text" name="eventDate" placeholder="Date" required />
    <input type="text" name="eventPlace" placeholder="Place" required />
    <input type="password" name="password" placeholder="Admin password" required />
    <input type="file" name="bgPhoto" accept="image/*" required />
    <button type="submit">Create</button>
  </form>
</div>
<div class="form-box">
  <h2>Events</h2>
  <form action="/admin/events" method="POST">
    <input type="password" name="password" placeholder="Admin password" required />
    <button type="submit">List events</button>
  </form>
</div>"#;
    page("Event admin", "", body)
}

/// Result of a successful event creation.
pub fn event_created(summary: &EventSummary, qr_svg: &str) -> String {
    let body = format!(
        r#"<div class="form-box">
  <h2>{name}</h2>
  <div class="event-place">{date} | {place}</div>
  <p>Guest link: <a href="{link}">{link}</a></p>
  <div class="qr">{qr}</div>
  <p><a href="/admin">Back to admin</a></p>
</div>"#,
        name = escape_html(&summary.event.name),
        date = escape_html(&summary.event.date),
        place = escape_html(&summary.event.place),
        link = escape_html(&summary.guest_link),
        qr = qr_svg,
    );
    page("Event created", "", &body)
}

/// All events with their guest links and a browse link per event.
pub fn events_list(summaries: &[EventSummary], password: &str) -> String {
    let rows: String = summaries
        .iter()
        .map(|summary| {
            format!(
                r#"<tr><td>{name}</td><td>{date}</td><td>{place}</td><td><a href="{link}">guest link</a></td><td><a href="/admin/photos/{id}?password={password}">uploads</a></td></tr>"#,
                name = escape_html(&summary.event.name),
                date = escape_html(&summary.event.date),
                place = escape_html(&summary.event.place),
                link = escape_html(&summary.guest_link),
                id = escape_html(&summary.event.id),
                password = escape_html(&urlencoding::encode(password)),
            )
        })
        .collect();

    let body = if summaries.is_empty() {
        r#"<div class="form-box"><h2>Events</h2><p>No events yet.</p></div>"#.to_string()
    } else {
        format!(
            r#"<div class="form-box wide">
  <h2>Events</h2>
  <table><tr><th>Name</th><th>Date</th><th>Place</th><th></th><th></th></tr>{rows}</table>
</div>"#
        )
    };
    page("Events", "", &body)
}

/// Signed links to every upload of one event.
pub fn photos_page(event_id: &str, uploads: &[UploadLink]) -> String {
    let items: String = uploads
        .iter()
        .map(|upload| {
            format!(
                r#"<tr><td><a href="{url}">{name}</a></td><td>{size}</td><td>{modified}</td></tr>"#,
                url = escape_html(&upload.signed_url),
                name = escape_html(&upload.display_name),
                size = upload.size,
                modified = upload.last_modified.format("%Y-%m-%d %H:%M:%S"),
            )
        })
        .collect();

    let body = if uploads.is_empty() {
        format!(
            r#"<div class="form-box"><h2>Uploads</h2><p>No uploads for event {}.</p></div>"#,
            escape_html(event_id)
        )
    } else {
        format!(
            r#"<div class="form-box wide">
  <h2>Uploads</h2>
  <table><tr><th>File</th><th>Bytes</th><th>Uploaded</th></tr>{items}</table>
</div>"#
        )
    };
    page("Uploads", "", &body)
}
