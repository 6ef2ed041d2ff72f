//! User-facing Russian texts. Messages are sent with HTML parse mode.

use crate::core::markup::{Dialect, MarkupError};
use crate::core::settings::{AudioFormat, SettingField, SettingsDefaults, UserSettings};

pub const WELCOME: &str = "Привет! Отправь мне текст на русском, и я пришлю ответ в виде голосового сообщения.\n\n\
Доступные команды:\n\
- /start — краткая справка\n\
- /help — подробная помощь и примеры\n\
- /set_voice — выбрать голос\n\
- /set_role — выбрать эмоцию\n\
- /set_speed — выбрать скорость\n\
- /set_format — выбрать формат аудио\n\
- /set_dialect — выбрать вид разметки\n\
- /settings — показать текущие настройки\n\
- /reset — сбросить настройки по умолчанию\n\
- /speak_ssml — синтез речи с SSML-разметкой\n\
- /toggle_format — включить/выключить автоформатирование\n\
- /demo_markup — примеры TTS разметки";

pub const NOT_RUSSIAN: &str = "Пожалуйста, отправь сообщение на русском.";

pub const TOO_LONG: &str = "Текст слишком длинный. Попробуй отправить более короткое сообщение.\n\
Если ты хотела использовать SSML-разметку, используй команду /speak_ssml";

pub const SPEECHKIT_FAILED: &str = "Ошибка при обращении к SpeechKit API. Попробуй позже.";

pub const FORMATTER_FAILED: &str =
    "Не удалось расставить разметку автоматически. Попробуй позже или выключи /toggle_format.";

pub const NOTHING_TO_SAY: &str = "В сообщении нет текста для озвучивания, только разметка.";

pub const SSML_USAGE: &str = "Пожалуйста, укажи SSML-разметку после команды.\n\
Пример: <code>/speak_ssml &lt;speak&gt;Привет, &lt;break time=\"500ms\"/&gt; мир!&lt;/speak&gt;</code>";

pub const SSML_NOT_WRAPPED: &str = "SSML-разметка должна быть обёрнута в теги &lt;speak&gt;...&lt;/speak&gt;\n\
Пример: <code>&lt;speak&gt;Ваш текст здесь&lt;/speak&gt;</code>";

pub const SSML_FOLDER_MISSING: &str = "Для использования SSML необходимо указать YANDEX_FOLDER_ID в файле .env\n\
Получить folder_id следует в консоли Yandex Cloud.";

pub const SSML_REJECTED: &str = "Ошибка в SSML-разметке. Проверь правильность синтаксиса.\n\
Подробнее о SSML: https://yandex.cloud/ru/docs/speechkit/tts/ssml";

pub const UNKNOWN_COMMAND: &str = "Неизвестная команда. Используй /help для списка доступных команд.";

pub const CHOOSE_VOICE: &str = "Выбери голос:";
pub const CHOOSE_SPEED: &str = "Скорость речи:";
pub const CHOOSE_FORMAT: &str = "Формат аудио:";
pub const CHOOSE_DIALECT: &str = "Вид разметки:";

pub const RESET_FAILED: &str = "❌ Ошибка при сбросе настроек. Попробуй позже.";
pub const SETTING_FAILED: &str = "❌ Не удалось сохранить настройку. Попробуй позже.";

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn help(defaults: &SettingsDefaults) -> String {
    format!(
        "<b>Как мною пользоваться</b>\n\n\
1. Просто пришли мне сообщение на русском.\n\
2. Я преобразую текст в речь и пришлю его в виде голосового сообщения.\n\n\
<b>Параметры синтеза</b>\n\n\
Голос по умолчанию: <code>{voice}</code>\n\
Эмоция по умолчанию: <code>{role}</code>\n\
Скорость по умолчанию: <code>{speed}</code>\n\n\
Поддерживаются только русскоязычные сообщения.\n\n\
<b>Разметка</b>\n\
Паузы <code>sil&lt;[300]&gt;</code>, ударения <code>м+олоко</code> и выделение <code>**слово**</code> \
работают прямо в тексте. Примеры: /demo_markup\n\n\
<b>SSML-разметка</b>\n\
Используй команду /speak_ssml для синтеза с разметкой SSML.\n\
Пример: <code>/speak_ssml &lt;speak&gt;Привет, &lt;break time=\"500ms\"/&gt; мир!&lt;/speak&gt;</code>\n\n\
Дополнительные команды:\n\
/set_voice, /set_role, /set_speed, /set_format, /set_dialect, /settings, /reset, /speak_ssml, /toggle_format, /demo_markup",
        voice = defaults.voice.display_name(),
        role = defaults.role.display_name(),
        speed = escape_html(&defaults.speed.display_name()),
    )
}

pub fn format_label(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::OggOpus => "OGG/Opus",
        AudioFormat::Mp3 => "MP3",
        AudioFormat::Wav => "WAV",
        AudioFormat::Lpcm => "PCM",
    }
}

pub fn dialect_label(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Inline => "TTS v3",
        Dialect::Legacy => "SSML",
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "✅ Вкл" } else { "❌ Выкл" }
}

pub fn settings(settings: &UserSettings) -> String {
    format!(
        "<b>Текущие настройки</b>\n\
Голос: <code>{}</code>\n\
Эмоция: <code>{}</code>\n\
Скорость: <code>{}</code>\n\
Формат: <code>{}</code>\n\
Автоформатирование: <code>{}</code>\n\
Разметка: <code>{}</code>",
        settings.voice.display_name(),
        settings.role.display_name(),
        escape_html(&settings.speed.display_name()),
        format_label(settings.format),
        on_off(settings.auto_format),
        dialect_label(settings.dialect),
    )
}

pub fn settings_reset(defaults: &UserSettings) -> String {
    format!("✅ Настройки сброшены!\n\n{}", settings(defaults))
}

pub fn auto_format_toggled(enabled: bool) -> String {
    if enabled {
        "<b>Автоформатирование включено ✅</b>\n\n\
Теперь я буду автоматически добавлять паузы и ударения для естественного звучания речи."
            .to_string()
    } else {
        "<b>Автоформатирование выключено ❌</b>\n\n\
Текст будет синтезироваться без дополнительной обработки."
            .to_string()
    }
}

/// Reply to a message that is already legacy markup
pub fn ssml_hint(text: &str) -> String {
    let preview: String = text.chars().take(50).collect();
    format!(
        "Похоже, ты отправила SSML-разметку. Используй команду:\n<code>/speak_ssml {}...</code>",
        escape_html(&preview)
    )
}

pub fn role_prompt(voice_name: &str) -> String {
    format!("Эмоция для голоса: {voice_name}")
}

pub fn role_prompt_after_voice_change(voice_name: &str) -> String {
    format!("Эмоция для голоса '{voice_name}':")
}

/// Plain text, sent through editMessageText without parse mode
pub fn setting_changed(field: SettingField, value: &str) -> String {
    format!("Ты выбрала {}: {value}", field.display_name())
}

pub fn role_unavailable(role_name: &str, voice_name: &str) -> String {
    format!("Эмоция «{role_name}» недоступна для голоса {voice_name}.")
}

pub fn invalid_value(field: SettingField) -> String {
    format!("Некорректное значение: {}.", field.display_name())
}

pub fn markup_error(error: &MarkupError) -> String {
    match error {
        MarkupError::Validation { token, reason, .. } => format!(
            "Ошибка в разметке: <code>{}</code>\n{}",
            escape_html(token),
            escape_html(reason)
        ),
        MarkupError::UnsupportedDialect { token, .. } => format!(
            "Разметка <code>{}</code> не поддерживается в режиме SSML. \
Смени вид разметки командой /set_dialect.",
            escape_html(token)
        ),
    }
}

/// Note sent after the audio when marks had to be dropped
pub fn dropped_marks(tokens: &[&str]) -> String {
    let list = tokens
        .iter()
        .map(|t| format!("<code>{}</code>", escape_html(t)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("ℹ️ В режиме SSML ударения и выделение не поддерживаются, убрано: {list}")
}

pub fn demo_markup(min_ms: u32, max_ms: u32) -> String {
    const EXAMPLES: [(&str, &str); 6] = [
        ("Без разметки", "Привет, мир! Как дела?"),
        ("С паузами", "Привет, sil<[300]> мир! sil<[500]> Как дела?"),
        ("Паузы после знаков", "Стоп! sil<[300]> Подумай об этом."),
        ("Поэзия с паузами", "Унылая пора! sil<[300]> Очей очарованье!"),
        ("Ударения в словах", "Зам+ок на двери и з+амок короля"),
        ("Выделение и контекстная пауза", "Это **очень** важно. <[medium]> Запомни."),
    ];

    let mut msg = String::from("<b>Примеры TTS разметки v3:</b>\n\n");
    for (title, text) in EXAMPLES {
        msg.push_str(&format!("<b>{title}:</b>\n<code>{}</code>\n\n", escape_html(text)));
    }
    msg.push_str(&format!(
        "<b>Доступные элементы разметки:</b>\n\
• <code>sil&lt;[мс]&gt;</code> — пауза заданной длительности ({min_ms}-{max_ms}мс)\n\
• <code>+</code> — ударение на гласной (напр: м+олоко)\n\
• <code>**слово**</code> — выделение слова\n\
• <code>&lt;[size]&gt;</code> — контекстная пауза (tiny/small/medium/large/huge)\n\n\
<b>Важно:</b> ударения и выделение работают только в режиме TTS v3.\n\
Текущие настройки можно проверить командой /settings\n\n\
Попробуй отправить текст с разметкой!"
    ));
    msg
}

/// At least one Cyrillic letter
pub fn looks_russian(text: &str) -> bool {
    text.chars()
        .flat_map(char::to_lowercase)
        .any(|c| ('а'..='я').contains(&c) || c == 'ё')
}

/// Whole message wrapped in `<speak>...</speak>`
pub fn is_wrapped_ssml(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("<speak") && text.ends_with("</speak>")
}
