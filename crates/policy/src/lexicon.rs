//! Locale token tables and the consent classifier.
//!
//! Every locale contributes three token sets: affirmations, denials and hard
//! interrupts. Matching is exact after trimming and lower-casing; anything
//! else is ambiguous, and ambiguous replies never count as consent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Language {
    PtBr,
    #[default]
    EnUs,
    EsEs,
    FrFr,
    DeDe,
    ItIt,
    ZhCn,
    JaJp,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::PtBr,
        Language::EnUs,
        Language::EsEs,
        Language::FrFr,
        Language::DeDe,
        Language::ItIt,
        Language::ZhCn,
        Language::JaJp,
    ];

    /// Resolves a BCP-47 style tag. Unsupported tags fall back to `en-US`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(tag))
            .unwrap_or_default()
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::PtBr => "pt-BR",
            Language::EnUs => "en-US",
            Language::EsEs => "es-ES",
            Language::FrFr => "fr-FR",
            Language::DeDe => "de-DE",
            Language::ItIt => "it-IT",
            Language::ZhCn => "zh-CN",
            Language::JaJp => "ja-JP",
        }
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Language::from_tag(&tag)
    }
}

impl From<Language> for &'static str {
    fn from(language: Language) -> Self {
        language.tag()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentSignal {
    Affirmative,
    Negative,
    Ambiguous,
}

impl ConsentSignal {
    pub fn is_affirmative(self) -> bool {
        matches!(self, ConsentSignal::Affirmative)
    }
}

#[derive(Debug)]
pub struct LocaleTokens {
    pub language: Language,
    pub affirmative: &'static [&'static str],
    pub negative: &'static [&'static str],
    pub interrupt: &'static [&'static str],
    /// Phrases that switch the assistant on or off.
    pub activate: &'static [&'static str],
    pub deactivate: &'static [&'static str],
}

/// Master on/off command recognised in the active locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantSwitch {
    Enable,
    Disable,
}

const LEXICON: &[LocaleTokens] = &[
    LocaleTokens {
        language: Language::PtBr,
        affirmative: &["sim", "confirmar", "confirmo", "pode", "ok"],
        negative: &["não", "nao", "cancelar", "negar"],
        interrupt: &["pare", "parar", "chega", "cancelar tudo"],
        activate: &["ativar custodian", "abrir custodian"],
        deactivate: &["desativar custodian", "fechar custodian"],
    },
    LocaleTokens {
        language: Language::EnUs,
        affirmative: &["yes", "yeah", "yep", "confirm", "ok", "okay", "proceed"],
        negative: &["no", "nope", "cancel", "deny"],
        interrupt: &["stop", "halt", "abort"],
        activate: &["activate custodian", "open custodian"],
        deactivate: &["deactivate custodian", "close custodian"],
    },
    LocaleTokens {
        language: Language::EsEs,
        affirmative: &["sí", "si", "confirmar", "vale", "ok"],
        negative: &["no", "cancelar", "negar"],
        interrupt: &["para", "alto", "detente", "basta"],
        activate: &["activar custodian", "abrir custodian"],
        deactivate: &["desactivar custodian", "cerrar custodian"],
    },
    LocaleTokens {
        language: Language::FrFr,
        affirmative: &["oui", "confirmer", "d'accord", "ok"],
        negative: &["non", "annuler", "refuser"],
        interrupt: &["arrête", "arrêtez", "stop"],
        activate: &["activer custodian", "ouvrir custodian"],
        deactivate: &["désactiver custodian", "fermer custodian"],
    },
    LocaleTokens {
        language: Language::DeDe,
        affirmative: &["ja", "bestätigen", "okay", "ok"],
        negative: &["nein", "abbrechen", "ablehnen"],
        interrupt: &["stopp", "halt", "anhalten"],
        activate: &["custodian aktivieren", "custodian öffnen"],
        deactivate: &["custodian deaktivieren", "custodian schließen"],
    },
    LocaleTokens {
        language: Language::ItIt,
        affirmative: &["sì", "si", "conferma", "confermo", "ok"],
        negative: &["no", "annulla", "rifiuta"],
        interrupt: &["fermati", "basta", "stop"],
        activate: &["attiva custodian", "apri custodian"],
        deactivate: &["disattiva custodian", "chiudi custodian"],
    },
    LocaleTokens {
        language: Language::ZhCn,
        affirmative: &["是", "是的", "好", "确认"],
        negative: &["不", "不要", "取消"],
        interrupt: &["停", "停止", "停下"],
        activate: &["启动custodian", "打开custodian"],
        deactivate: &["停用custodian", "关闭custodian"],
    },
    LocaleTokens {
        language: Language::JaJp,
        affirmative: &["はい", "確認", "お願いします"],
        negative: &["いいえ", "キャンセル", "やめる"],
        interrupt: &["止めて", "ストップ", "停止"],
        activate: &["custodianを起動", "custodianを開く"],
        deactivate: &["custodianを停止", "custodianを閉じる"],
    },
];

pub fn tokens_for(language: Language) -> &'static LocaleTokens {
    LEXICON
        .iter()
        .find(|entry| entry.language == language)
        .unwrap_or(&LEXICON[1])
}

/// Trim and case-fold. No other normalisation is applied.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classifies a final transcript or typed reply against the active locale.
pub fn classify_consent(text: &str, language: Language) -> ConsentSignal {
    let normalized = normalize(text);
    let tokens = tokens_for(language);

    if tokens.affirmative.iter().any(|t| *t == normalized) {
        ConsentSignal::Affirmative
    } else if tokens.negative.iter().any(|t| *t == normalized) {
        ConsentSignal::Negative
    } else {
        ConsentSignal::Ambiguous
    }
}

/// Hard-interrupt detection is checked against every locale: stopping is
/// always the safe outcome, so a user switching language mid-session still
/// reaches the kill switch.
pub fn is_hard_interrupt(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return false;
    }
    LEXICON
        .iter()
        .any(|entry| entry.interrupt.iter().any(|t| *t == normalized))
}

/// Recognises an exact on/off phrase for the assistant in the active locale.
pub fn classify_switch(text: &str, language: Language) -> Option<AssistantSwitch> {
    let normalized = normalize(text);
    let tokens = tokens_for(language);

    if tokens.activate.iter().any(|t| *t == normalized) {
        Some(AssistantSwitch::Enable)
    } else if tokens.deactivate.iter().any(|t| *t == normalized) {
        Some(AssistantSwitch::Disable)
    } else {
        None
    }
}
