//! Page inspection helpers for the login flow

use once_cell::sync::Lazy;
use regex::Regex;

static FLASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="flash (success|error)"[^>]*>(.*?)</div>"#).unwrap()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static FORM_ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<form[^>]*action="([^"]+)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// Text of the first `.flash.success` / `.flash.error` box, without markup
/// or the close glyph.
pub fn extract_flash(html: &str, kind: FlashKind) -> Option<String> {
    let wanted = match kind {
        FlashKind::Success => "success",
        FlashKind::Error => "error",
    };

    FLASH_RE
        .captures_iter(html)
        .find(|c| &c[1] == wanted)
        .map(|c| {
            let text = TAG_RE.replace_all(&c[2], " ");
            text.replace('×', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
}

/// Whether an element with this id attribute is present.
pub fn has_element_id(html: &str, id: &str) -> bool {
    html.contains(&format!("id=\"{id}\""))
}

pub fn form_action(html: &str) -> Option<&str> {
    FORM_ACTION_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Value of `name` in a `Cookie:` style header (`a=1; b=2`).
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECURE_PAGE: &str = r##"
        <div class="row">
          <div id="flash-messages" class="large-12 columns">
            <div data-alert id="flash" class="flash success">
              You logged into a secure area!
              <a href="#" class="close">×</a>
            </div>
          </div>
        </div>"##;

    const LOGIN_PAGE: &str = r##"
        <form name="login" id="login" action="/authenticate" method="post">
          <input type="text" name="username" id="username">
          <input type="password" name="password" id="password">
          <button class="radius" type="submit"><i class="fa fa-2x fa-sign-in"> Login</i></button>
        </form>"##;

    #[test]
    fn flash_success_text() {
        assert_eq!(
            extract_flash(SECURE_PAGE, FlashKind::Success).as_deref(),
            Some("You logged into a secure area!")
        );
        assert!(extract_flash(SECURE_PAGE, FlashKind::Error).is_none());
    }

    #[test]
    fn flash_error_text() {
        let html = r##"<div data-alert id="flash" class="flash error">
            Your password is invalid!
            <a href="#" class="close">×</a></div>"##;
        assert_eq!(
            extract_flash(html, FlashKind::Error).as_deref(),
            Some("Your password is invalid!")
        );
    }

    #[test]
    fn login_form_elements() {
        assert!(has_element_id(LOGIN_PAGE, "username"));
        assert!(has_element_id(LOGIN_PAGE, "password"));
        assert!(!has_element_id(LOGIN_PAGE, "otp"));
        assert_eq!(form_action(LOGIN_PAGE), Some("/authenticate"));
        assert_eq!(form_action("<p>no form</p>"), None);
    }

    #[test]
    fn cookie_lookup() {
        let header = "optimizelyEndUserId=oeu1; rack.session=BAh7CEkiD3Nlc3Np%3D%3D--abc";
        assert_eq!(find_cookie(header, "rack.session"), Some("BAh7CEkiD3Nlc3Np%3D%3D--abc"));
        assert_eq!(find_cookie(header, "missing"), None);
    }
}
