//! Static character registry for the photo booth.
//!
//! Four fixed characters, each carrying a persona system prompt, a synthesis
//! voice, and an optional voice-conversion model descriptor. Lookups outside
//! the closed set fall back to a generic default profile. The registry is
//! immutable for the process lifetime.

mod selection;

pub use selection::SelectionPolicy;

use serde::{Deserialize, Serialize};

/// The closed set of character identifiers, in registry order.
pub const CHARACTER_IDS: [&str; 4] = ["cheb", "gena", "shap", "volc"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Voice-conversion model descriptor for one character.
pub struct ConversionModel {
    /// Model name; the conversion service loads `<model>.pth`.
    pub model: String,
    /// Whether a feature-index file (`logs/<model>.index`) exists for the model.
    pub has_index: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Immutable profile for one character.
pub struct CharacterProfile {
    pub id: String,
    /// Persona instruction supplied as the system message to the completion
    /// service.
    pub persona_prompt: String,
    /// Instruction text for the generative image-edit (stylize) flow.
    pub edit_instruction: String,
    /// Synthesis voice identifier understood by the synthesis service.
    pub voice: String,
    /// Conversion model, when the character has a cloned voice.
    pub conversion: Option<ConversionModel>,
}

fn profile(
    id: &str,
    persona_prompt: &str,
    edit_instruction: &str,
    voice: &str,
    conversion: Option<ConversionModel>,
) -> CharacterProfile {
    CharacterProfile {
        id: id.to_string(),
        persona_prompt: persona_prompt.to_string(),
        edit_instruction: edit_instruction.to_string(),
        voice: voice.to_string(),
        conversion,
    }
}

fn conversion(model: &str, has_index: bool) -> Option<ConversionModel> {
    Some(ConversionModel {
        model: model.to_string(),
        has_index,
    })
}

/// Looks up a character profile, falling back to the generic default when the
/// identifier is outside the closed set.
pub fn profile_for(character_id: &str) -> CharacterProfile {
    match character_id {
        "cheb" => profile(
            "cheb",
            "Ты — Чебурашка, добрый и наивный зверёк с большими ушами. \
             Отвечай коротко, дружелюбно и по-детски простодушно, \
             обращайся к собеседнику как к другу.",
            "Удали фон у всех людей и фигур на фото и помести их в мир \
             советского мультика про Чебурашку. Фон должен быть уютным и \
             добрым, в стиле классической советской анимации.",
            "alena",
            conversion("cheb", true),
        ),
        "gena" => profile(
            "gena",
            "Ты — крокодил Гена, рассудительный и вежливый. Отвечай \
             спокойно и обстоятельно, иногда упоминай работу в зоопарке \
             и игру на гармошке.",
            "Удали фон у всех людей и фигур на фото и помести их рядом с \
             крокодилом Геной, в декорации советского мультфильма: зоопарк, \
             гармошка, тёплые осенние тона.",
            "ermil",
            conversion("gena", true),
        ),
        "shap" => profile(
            "shap",
            "Ты — старуха Шапокляк, язвительная проказница. Отвечай с \
             хитринкой и лёгким ехидством, но безобидно, и не забывай \
             про свою крыску Лариску.",
            "Удали фон у всех людей и фигур на фото и помести их в \
             проказливый мир старухи Шапокляк: городской дворик из \
             советского мультфильма, рядом крыска Лариска.",
            "jane",
            conversion("shap", true),
        ),
        "volc" => profile(
            "volc",
            "Ты — Волк из «Ну, погоди!», хрипловатый и самоуверенный, но \
             добродушный. Отвечай коротко и с азартом.",
            "Удали фон у всех людей и фигур на фото и помести их в мир \
             мультфильма «Ну, погоди!»: яркая рисованная улица, рядом Волк \
             на мотоцикле.",
            "filipp",
            conversion("volc", false),
        ),
        _ => profile(
            "default",
            "Ты — добрый мультяшный персонаж. Отвечай коротко и \
             дружелюбно.",
            "Удали фон у всех людей и фигур на фото и помести их в добрый \
             рисованный мультяшный мир в стиле классической советской \
             анимации.",
            "alena",
            None,
        ),
    }
}

/// True when the identifier belongs to the closed character set.
pub fn is_known_character(character_id: &str) -> bool {
    CHARACTER_IDS.contains(&character_id)
}

#[cfg(test)]
mod tests {
    use super::{is_known_character, profile_for, CHARACTER_IDS};

    #[test]
    fn unit_registry_covers_the_closed_set() {
        for id in CHARACTER_IDS {
            let profile = profile_for(id);
            assert_eq!(profile.id, id);
            assert!(!profile.persona_prompt.is_empty());
            assert!(!profile.edit_instruction.is_empty());
            assert!(!profile.voice.is_empty());
            assert!(is_known_character(id));
        }
    }

    #[test]
    fn unit_unknown_identifier_falls_back_to_default_profile() {
        let profile = profile_for("mystery-guest");
        assert_eq!(profile.id, "default");
        assert_eq!(profile.voice, "alena");
        assert!(profile.conversion.is_none());
        assert!(!is_known_character("mystery-guest"));
    }

    #[test]
    fn unit_only_volc_lacks_an_index_file() {
        for id in CHARACTER_IDS {
            let conversion = profile_for(id).conversion.expect("conversion model");
            assert_eq!(conversion.model, id);
            assert_eq!(conversion.has_index, id != "volc");
        }
    }
}
