//! Localized user-facing strings
//!
//! Strings live in `locales/en.ftl` and are rendered with Fluent. Lookups
//! never fail: a missing key renders as the key itself so a typo shows up in
//! the chat instead of crashing it.

use std::sync::LazyLock;

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use unic_langid::LanguageIdentifier;

/// English translations, compiled into the binary
const EN_FTL: &str = include_str!("../locales/en.ftl");

/// Locale of the bundled translations
const DEFAULT_LOCALE: &str = "en-US";

static BUNDLE: LazyLock<FluentBundle<FluentResource>> = LazyLock::new(build_bundle);

fn build_bundle() -> FluentBundle<FluentResource> {
    let locale: LanguageIdentifier = DEFAULT_LOCALE.parse().unwrap_or_default();
    let mut bundle = FluentBundle::new_concurrent(vec![locale]);

    // Unicode isolation marks would end up in terminal output
    bundle.set_use_isolating(false);

    let resource = match FluentResource::try_new(EN_FTL.to_string()) {
        Ok(resource) => resource,
        Err((resource, errors)) => {
            tracing::warn!("Translation file has {} parse error(s)", errors.len());
            resource
        }
    };

    if let Err(errors) = bundle.add_resource(resource) {
        tracing::warn!("Translation file has {} duplicate key(s)", errors.len());
    }

    bundle
}

fn format(key: &str, args: Option<&FluentArgs>) -> String {
    let Some(message) = BUNDLE.get_message(key) else {
        return key.to_string();
    };
    let Some(pattern) = message.value() else {
        return key.to_string();
    };

    let mut errors = Vec::new();
    let text = BUNDLE.format_pattern(pattern, args, &mut errors);
    if !errors.is_empty() {
        tracing::debug!("Formatting '{}' reported {} error(s)", key, errors.len());
    }
    text.into_owned()
}

/// Translate a key without arguments
pub fn t(key: &str) -> String {
    format(key, None)
}

/// Translate a key with named arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut fluent_args = FluentArgs::new();
    for (name, value) in args {
        fluent_args.set(*name, value.to_string());
    }
    format(key, Some(&fluent_args))
}
