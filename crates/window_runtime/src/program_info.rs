//! Menu/about labels for a registered window, resolved through a translation collaborator.

use serde::Serialize;
use serde_json::Value;

use crate::model::WindowConfig;

/// External localization lookup.
pub trait Translate {
    /// Returns the translation for `key`, or `fallback` when there is none.
    fn translate(&self, key: &str, fallback: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
/// Translator that always returns the fallback text.
pub struct FallbackTranslator;

impl Translate for FallbackTranslator {
    fn translate(&self, _key: &str, fallback: &str) -> String {
        fallback.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    pub program_label: String,
    pub info_label: String,
    pub icon: String,
    pub about: AboutInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutInfo {
    pub name: String,
    pub tagline: String,
    pub version: String,
    pub copyright: String,
}

/// Builds program info for `config`.
///
/// Keys are `<descriptiveKey>.programLabel`, `.infoLabel`, `.about.name`, `.about.tagline`,
/// `.about.version` and `.about.copyright`. Fallbacks come from the config metadata, then from
/// the window id.
pub fn program_info(config: &WindowConfig, translator: &dyn Translate) -> ProgramInfo {
    let prefix = if config.descriptive_key.is_empty() {
        config.id.as_str()
    } else {
        config.descriptive_key.as_str()
    };
    let lookup = |suffix: &str, fallback: &str| {
        translator.translate(&format!("{prefix}.{suffix}"), fallback)
    };

    let default_label = metadata_str(&config.metadata, "programLabel")
        .map(str::to_string)
        .unwrap_or_else(|| humanize_id(&config.id));
    let program_label = lookup("programLabel", &default_label);
    let info_label = lookup("infoLabel", &format!("About {program_label}"));
    let name = lookup("about.name", &program_label);
    let tagline = lookup(
        "about.tagline",
        metadata_str(&config.metadata, "tagline").unwrap_or_default(),
    );
    let version = lookup(
        "about.version",
        metadata_str(&config.metadata, "version").unwrap_or(env!("CARGO_PKG_VERSION")),
    );
    let copyright = lookup(
        "about.copyright",
        metadata_str(&config.metadata, "copyright").unwrap_or_default(),
    );

    ProgramInfo {
        program_label,
        info_label,
        icon: config.icon.clone(),
        about: AboutInfo {
            name,
            tagline,
            version,
            copyright,
        },
    }
}

fn metadata_str<'a>(metadata: &'a Value, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(Value::as_str)
}

/// `text-editor` -> `Text Editor`.
fn humanize_id(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
