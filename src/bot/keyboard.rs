//! Inline keyboards. Callback data is `<field>:<value>`.

use crate::core::markup::Dialect;
use crate::core::settings::{AudioFormat, SPEED_PRESETS, SettingField, Voice};
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::texts;

const ROW_WIDTH: usize = 3;

/// Lay `(label, value)` options out in rows of three
pub fn build_keyboard<'a>(
    field: SettingField,
    options: impl IntoIterator<Item = (String, &'a str)>,
) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = options
        .into_iter()
        .map(|(label, value)| {
            InlineKeyboardButton::callback(label, format!("{}:{value}", field.as_str()))
        })
        .collect();

    InlineKeyboardMarkup {
        inline_keyboard: buttons.chunks(ROW_WIDTH).map(<[_]>::to_vec).collect(),
    }
}

pub fn voice_keyboard() -> InlineKeyboardMarkup {
    build_keyboard(
        SettingField::Voice,
        Voice::all()
            .iter()
            .map(|v| (v.display_name().to_string(), v.as_str())),
    )
}

/// Only the roles `voice` can be synthesised with
pub fn role_keyboard(voice: Voice) -> InlineKeyboardMarkup {
    build_keyboard(
        SettingField::Role,
        voice
            .supported_roles()
            .iter()
            .map(|r| (r.display_name().to_string(), r.as_str())),
    )
}

pub fn speed_keyboard() -> InlineKeyboardMarkup {
    let values: Vec<String> = SPEED_PRESETS.iter().map(|s| s.to_string()).collect();
    build_keyboard(
        SettingField::Speed,
        SPEED_PRESETS
            .iter()
            .zip(values.iter())
            .map(|(s, v)| (s.display_name(), v.as_str())),
    )
}

pub fn format_keyboard() -> InlineKeyboardMarkup {
    build_keyboard(
        SettingField::Format,
        AudioFormat::all()
            .iter()
            .map(|f| (texts::format_label(*f).to_string(), f.as_str())),
    )
}

pub fn dialect_keyboard() -> InlineKeyboardMarkup {
    build_keyboard(
        SettingField::Dialect,
        Dialect::all()
            .iter()
            .map(|d| (texts::dialect_label(*d).to_string(), d.as_str())),
    )
}

/// Split callback data into the field and raw value
pub fn parse_callback(data: &str) -> Option<(SettingField, &str)> {
    let (field, value) = data.split_once(':')?;
    let field = SettingField::from_name(field)?;
    Some((field, value))
}
