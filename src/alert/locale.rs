//! Static localized strings shown when generation cannot produce a message

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Es, Language::Fr, Language::De];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// English name, used when instructing the generator
    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
        }
    }

    pub fn generation_failed(&self) -> &'static str {
        match self {
            Language::En => "Could not generate the emergency alert. Check your connection and contact emergency services directly if needed.",
            Language::Es => "No se pudo generar la alerta de emergencia. Revise su conexión y contacte directamente a los servicios de emergencia si es necesario.",
            Language::Fr => "Impossible de générer l'alerte d'urgence. Vérifiez votre connexion et contactez directement les services d'urgence si nécessaire.",
            Language::De => "Der Notfallalarm konnte nicht erstellt werden. Prüfen Sie Ihre Verbindung und wenden Sie sich bei Bedarf direkt an den Notdienst.",
        }
    }

    pub fn alert_in_progress(&self) -> &'static str {
        match self {
            Language::En => "An emergency alert is already being prepared.",
            Language::Es => "Ya se está preparando una alerta de emergencia.",
            Language::Fr => "Une alerte d'urgence est déjà en cours de préparation.",
            Language::De => "Ein Notfallalarm wird bereits erstellt.",
        }
    }

    pub fn no_reading(&self) -> &'static str {
        match self {
            Language::En => "No vitals are available yet. Connect the monitor first.",
            Language::Es => "Aún no hay signos vitales disponibles. Conecte primero el monitor.",
            Language::Fr => "Aucun signe vital disponible pour le moment. Connectez d'abord le moniteur.",
            Language::De => "Noch keine Vitalwerte verfügbar. Verbinden Sie zuerst den Monitor.",
        }
    }

    pub fn notification_title(&self) -> &'static str {
        match self {
            Language::En => "Critical vitals alert",
            Language::Es => "Alerta de signos vitales críticos",
            Language::Fr => "Alerte de signes vitaux critiques",
            Language::De => "Warnung: kritische Vitalwerte",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s) || lang.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported language: {}", s))
    }
}
