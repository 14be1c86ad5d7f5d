//! In-page JavaScript used by the CDP session

use serde::Deserialize;
use std::collections::HashMap;

use super::traits::{BoundingBox, ElementHandle, Locator};

pub const READY_STATE: &str = "document.readyState";
pub const CURRENT_URL: &str = "window.location.href";

/// What the locate script does to the element once found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateAction {
    /// Describe only
    Probe,
    /// Scroll into view first, so the bounds are clickable
    Scroll,
    /// Focus first, for typing
    Focus,
}

impl LocateAction {
    fn as_str(&self) -> &'static str {
        match self {
            LocateAction::Probe => "probe",
            LocateAction::Scroll => "scroll",
            LocateAction::Focus => "focus",
        }
    }
}

const LOCATE_BODY: &str = r#"
  const find = () => {
    const byLinkText = (match) =>
      Array.from(document.querySelectorAll('a'))
        .find((a) => match((a.innerText || a.textContent || '').trim())) || null;
    switch (strategy) {
      case 'css': return document.querySelector(selector);
      case 'id': return document.getElementById(selector);
      case 'xpath':
        return document.evaluate(selector, document, null,
          XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
      case 'link_text': return byLinkText((text) => text === selector);
      case 'partial_link_text': return byLinkText((text) => text.includes(selector));
      default: return null;
    }
  };
  const el = find();
  if (!el) return { found: false };
  if (action === 'scroll') el.scrollIntoView({ block: 'center', inline: 'center' });
  if (action === 'focus') el.focus();
  const r = el.getBoundingClientRect();
  const s = window.getComputedStyle(el);
  const displayed = r.width > 0 && r.height > 0 && s.visibility !== 'hidden'
    && s.display !== 'none' && parseFloat(s.opacity || '1') > 0;
  const attributes = {};
  for (const a of Array.from(el.attributes)) attributes[a.name] = a.value;
  return {
    found: true,
    tag: el.tagName.toLowerCase(),
    text: (el.innerText || el.textContent || '').trim(),
    displayed,
    enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
    attributes,
    bounds: { x: r.x, y: r.y, width: r.width, height: r.height },
  };
"#;

/// Build the locate script for `locator`
pub fn locate(locator: &Locator, action: LocateAction) -> String {
    // JSON string literals are valid JavaScript string literals
    let strategy = serde_json::Value::String(locator.strategy().as_str().to_string());
    let selector = serde_json::Value::String(locator.selector().to_string());
    let action = serde_json::Value::String(action.as_str().to_string());

    format!(
        "(() => {{\n  const strategy = {};\n  const selector = {};\n  const action = {};\n{}}})()",
        strategy, selector, action, LOCATE_BODY
    )
}

/// Value returned by the locate script
#[derive(Debug, Clone, Deserialize)]
pub struct LocateResult {
    pub found: bool,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub displayed: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub bounds: BoundingBox,
}

impl LocateResult {
    pub fn into_handle(self, locator: &Locator) -> Option<ElementHandle> {
        if !self.found {
            return None;
        }
        Some(ElementHandle {
            locator: locator.clone(),
            tag_name: self.tag,
            text: self.text,
            displayed: self.displayed,
            enabled: self.enabled,
            attributes: self.attributes,
            bounds: self.bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::traits::Strategy;

    #[test]
    fn test_selector_is_escaped() {
        let locator = Locator::new(Strategy::XPath, r#"//a[text()="It's \ here"]"#);
        let script = locate(&locator, LocateAction::Probe);

        assert!(script.contains(r#"const selector = "//a[text()=\"It's \\ here\"]";"#));
        assert!(script.contains(r#"const strategy = "xpath";"#));
        assert!(script.contains(r#"const action = "probe";"#));
    }

    #[test]
    fn test_result_into_handle() {
        let value = serde_json::json!({
            "found": true,
            "tag": "a",
            "text": "Start Free Trial",
            "displayed": true,
            "enabled": true,
            "attributes": { "href": "/auth/signup" },
            "bounds": { "x": 1.0, "y": 2.0, "width": 30.0, "height": 10.0 }
        });
        let locator = Locator::link_text("Start Free Trial");
        let result: LocateResult = serde_json::from_value(value).unwrap();
        let handle = result.into_handle(&locator).unwrap();

        assert_eq!(handle.attribute("href"), Some("/auth/signup"));
        assert!(handle.is_interactable());
        assert_eq!(handle.locator, locator);
    }

    #[test]
    fn test_absent_result() {
        let result: LocateResult =
            serde_json::from_value(serde_json::json!({ "found": false })).unwrap();
        assert!(result.into_handle(&Locator::id("nope")).is_none());
    }
}
