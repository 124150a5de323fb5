//! Server-rendered HTML pages
//!
//! Every piece of user-controlled text goes through [`escape_html`].

use crate::models::GeneratedCode;

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn layout(title: &str, signed_in: bool, body: &str) -> String {
    let nav = if signed_in {
        r#"<a href="/">New QR code</a> | <a href="/my_qrs">My QR codes</a> | <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/">Home</a> | <a href="/login">Log in</a> | <a href="/register">Register</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav>{nav}</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn message_block(class: &str, message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<p class="{}">{}</p>"#, class, escape_html(m)))
        .unwrap_or_default()
}

/// Submission form
pub fn index_page(signed_in: bool, error: Option<&str>, url: &str) -> String {
    let body = format!(
        r#"<h1>QR Code Generator</h1>
{error}
<form method="post" action="/">
<label for="url">URL</label>
<input type="text" id="url" name="url" value="{url}" maxlength="2083" required>
<button type="submit">Generate</button>
</form>"#,
        error = message_block("error", error),
        url = escape_html(url),
    );
    layout("QR Code Generator", signed_in, &body)
}

/// A stored code
pub fn result_page(signed_in: bool, code: &GeneratedCode) -> String {
    let url = escape_html(&code.source_url);
    let body = format!(
        r#"<h1>Your QR code</h1>
<p>URL: <a href="{url}">{url}</a></p>
<img src="{image}" alt="QR code for {url}">"#,
        image = escape_html(&code.image_payload),
    );
    layout("QR Code Result", signed_in, &body)
}

/// The signed-in user's codes
pub fn my_codes_page(codes: &[GeneratedCode], status: Option<&str>) -> String {
    let items = if codes.is_empty() {
        "<p>You have not generated any QR codes yet.</p>".to_string()
    } else {
        let rows: Vec<String> = codes
            .iter()
            .map(|code| {
                format!(
                    r#"<li>
<a href="/result/{id}">{url}</a>
<img src="{image}" alt="QR code" width="96" height="96">
<form method="post" action="/delete_qr_code/{id}"><button type="submit">Delete</button></form>
</li>"#,
                    id = code.id,
                    url = escape_html(&code.source_url),
                    image = escape_html(&code.image_payload),
                )
            })
            .collect();
        format!("<ul>\n{}\n</ul>", rows.join("\n"))
    };

    let body = format!(
        "<h1>My QR codes</h1>\n{}\n{}",
        message_block("status", status),
        items
    );
    layout("My QR codes", true, &body)
}

fn credentials_form(action: &str, heading: &str, button: &str, username: &str) -> String {
    format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
<label for="username">Username</label>
<input type="text" id="username" name="username" value="{username}" required>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<button type="submit">{button}</button>
</form>"#,
        username = escape_html(username),
    )
}

pub fn login_page(error: Option<&str>, status: Option<&str>, username: &str) -> String {
    let body = format!(
        "{}{}\n{}\n<p>No account? <a href=\"/register\">Register</a></p>",
        message_block("status", status),
        message_block("error", error),
        credentials_form("/login", "Log in", "Log in", username),
    );
    layout("Log in", false, &body)
}

pub fn register_page(error: Option<&str>, username: &str) -> String {
    let body = format!(
        "{}\n{}\n<p>Already registered? <a href=\"/login\">Log in</a></p>",
        message_block("error", error),
        credentials_form("/register", "Register", "Create account", username),
    );
    layout("Register", false, &body)
}

pub fn not_found_page() -> String {
    layout(
        "Not found",
        false,
        "<h1>QR Code not found</h1>\n<p><a href=\"/\">Back</a></p>",
    )
}

/// Generic page for failures the user cannot fix
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Error</h1>\n{}\n<p><a href=\"/\">Back</a></p>",
        message_block("error", Some(message))
    );
    layout("Error", false, &body)
}
