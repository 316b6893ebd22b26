use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please enter a valid number.")]
    NotANumber { input: String },
    #[error("Invalid choice {choice}. Please pick a number between 1 and {max}.")]
    OutOfRange { choice: usize, max: usize },
    #[error("Unknown option '{key}'")]
    UnknownKey { key: String },
}

/// A fixed, ordered set of menu options.
///
/// Menus are numbered from 1 in the order of `ALL`; `select` is the only way
/// a number becomes an option.
pub trait Catalog: Sized + Copy + 'static {
    const ALL: &'static [Self];

    /// Stable identifier, used for storage and presets.
    fn key(&self) -> &'static str;

    /// Human label shown in menus.
    fn label(&self) -> &'static str;

    fn select(choice: usize) -> Result<Self, SelectionError> {
        choice
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
            .ok_or(SelectionError::OutOfRange {
                choice,
                max: Self::ALL.len(),
            })
    }

    fn select_str(input: &str) -> Result<Self, SelectionError> {
        let choice = input
            .trim()
            .parse::<usize>()
            .map_err(|_| SelectionError::NotANumber {
                input: input.trim().to_string(),
            })?;
        Self::select(choice)
    }

    fn from_key(key: &str) -> Result<Self, SelectionError> {
        let wanted = key.trim();
        Self::ALL
            .iter()
            .find(|option| {
                option.key().eq_ignore_ascii_case(wanted) || option.label().eq_ignore_ascii_case(wanted)
            })
            .copied()
            .ok_or_else(|| SelectionError::UnknownKey {
                key: wanted.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Spanish,
    French,
    German,
    Italian,
    Portuguese,
    Russian,
    Japanese,
    Chinese,
    Korean,
    Arabic,
    Hindi,
    Dutch,
    Swedish,
    Turkish,
    Polish,
}

impl Catalog for Language {
    const ALL: &'static [Self] = &[
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Japanese,
        Language::Chinese,
        Language::Korean,
        Language::Arabic,
        Language::Hindi,
        Language::Dutch,
        Language::Swedish,
        Language::Turkish,
        Language::Polish,
    ];

    fn key(&self) -> &'static str {
        self.label()
    }

    fn label(&self) -> &'static str {
        match self {
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
            Language::Korean => "Korean",
            Language::Arabic => "Arabic",
            Language::Hindi => "Hindi",
            Language::Dutch => "Dutch",
            Language::Swedish => "Swedish",
            Language::Turkish => "Turkish",
            Language::Polish => "Polish",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

impl Catalog for Proficiency {
    const ALL: &'static [Self] = &[
        Proficiency::Beginner,
        Proficiency::Intermediate,
        Proficiency::Advanced,
    ];

    fn key(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "Beginner",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Advanced => "Advanced",
        }
    }
}

impl Proficiency {
    /// How the simulated speaker should pitch its language for this level.
    pub fn speaker_guidance(&self, native_language: &str) -> String {
        match self {
            Proficiency::Beginner => format!(
                "Use simple phrases, speak slowly, and provide translations to {} when needed.",
                native_language
            ),
            Proficiency::Intermediate => {
                "Use everyday language, occasionally provide translations for difficult words.".to_string()
            }
            Proficiency::Advanced => {
                "Use natural, native-like speech with occasional challenging vocabulary.".to_string()
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    Restaurant,
    Hotel,
    Shopping,
    Airport,
    Doctor,
    JobInterview,
    MakingFriends,
    PublicTransport,
}

impl Catalog for Scene {
    const ALL: &'static [Self] = &[
        Scene::Restaurant,
        Scene::Hotel,
        Scene::Shopping,
        Scene::Airport,
        Scene::Doctor,
        Scene::JobInterview,
        Scene::MakingFriends,
        Scene::PublicTransport,
    ];

    fn key(&self) -> &'static str {
        match self {
            Scene::Restaurant => "restaurant",
            Scene::Hotel => "hotel",
            Scene::Shopping => "shopping",
            Scene::Airport => "airport",
            Scene::Doctor => "doctor",
            Scene::JobInterview => "job_interview",
            Scene::MakingFriends => "making_friends",
            Scene::PublicTransport => "public_transport",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Scene::Restaurant => "Restaurant",
            Scene::Hotel => "Hotel",
            Scene::Shopping => "Shopping",
            Scene::Airport => "Airport",
            Scene::Doctor => "Doctor",
            Scene::JobInterview => "Job Interview",
            Scene::MakingFriends => "Making Friends",
            Scene::PublicTransport => "Public Transport",
        }
    }
}

impl Scene {
    pub fn description(&self) -> &'static str {
        match self {
            Scene::Restaurant => "You are at a restaurant ordering food and chatting with the waiter/waitress.",
            Scene::Hotel => "You are checking into a hotel and talking with the receptionist.",
            Scene::Shopping => "You are shopping for clothes and asking questions to a shop assistant.",
            Scene::Airport => "You are at the airport asking for information about your flight.",
            Scene::Doctor => "You are visiting a doctor and explaining your symptoms.",
            Scene::JobInterview => "You are being interviewed for a job position.",
            Scene::MakingFriends => "You are meeting someone new and trying to make friends.",
            Scene::PublicTransport => "You are asking for directions on public transportation.",
        }
    }
}

macro_rules! catalog_text_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $ty {
            type Err = SelectionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Catalog>::from_key(s)
            }
        }
    )*};
}

catalog_text_impls!(Language, Proficiency, Scene);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_have_expected_sizes() {
        assert_eq!(Language::ALL.len(), 15);
        assert_eq!(Proficiency::ALL.len(), 3);
        assert_eq!(Scene::ALL.len(), 8);
    }

    #[test]
    fn select_is_one_based() {
        assert_eq!(Language::select(1), Ok(Language::Spanish));
        assert_eq!(Language::select(15), Ok(Language::Polish));
        assert_eq!(Proficiency::select(3), Ok(Proficiency::Advanced));
        assert_eq!(Scene::select(8), Ok(Scene::PublicTransport));
    }

    #[test]
    fn select_rejects_out_of_range() {
        assert_eq!(
            Scene::select(0),
            Err(SelectionError::OutOfRange { choice: 0, max: 8 })
        );
        assert_eq!(
            Proficiency::select(4),
            Err(SelectionError::OutOfRange { choice: 4, max: 3 })
        );
    }

    #[test]
    fn select_str_rejects_non_numeric() {
        assert!(matches!(
            Language::select_str("two"),
            Err(SelectionError::NotANumber { .. })
        ));
        assert_eq!(Language::select_str(" 2 "), Ok(Language::French));
    }

    #[test]
    fn from_key_accepts_key_or_label() {
        assert_eq!("job_interview".parse::<Scene>(), Ok(Scene::JobInterview));
        assert_eq!("Job Interview".parse::<Scene>(), Ok(Scene::JobInterview));
        assert_eq!("ADVANCED".parse::<Proficiency>(), Ok(Proficiency::Advanced));
        assert_eq!("japanese".parse::<Language>(), Ok(Language::Japanese));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn display_uses_storage_key() {
        assert_eq!(Scene::MakingFriends.to_string(), "making_friends");
        assert_eq!(Proficiency::Beginner.to_string(), "beginner");
        assert_eq!(Language::Korean.to_string(), "Korean");
    }

    #[test]
    fn beginner_guidance_mentions_native_language() {
        assert!(Proficiency::Beginner
            .speaker_guidance("English")
            .contains("translations to English"));
    }
}
