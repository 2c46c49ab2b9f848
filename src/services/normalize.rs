//! Text folding shared by queries, dictionary keys and language names.

use unicode_normalization::UnicodeNormalization;

const STRIPPED: [char; 6] = ['\'', '’', '‘', '"', '“', '”'];

pub fn normalize(text: &str) -> String {
    // Compose first: `fold` only knows pre-composed letters.
    let composed: String = text.nfc().collect();
    let mut s = composed.trim().to_lowercase();

    s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if STRIPPED.contains(&ch) {
            continue;
        }
        match fold(ch) {
            Some(folded) => out.push_str(folded),
            None => out.push(ch),
        }
    }

    // Stripping quotes can leave edge or doubled spaces behind ("l' eau").
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Language identifiers fold like text and never contain spaces.
pub fn normalize_language(name: &str) -> String {
    normalize(name).replace(' ', "")
}

fn fold(ch: char) -> Option<&'static str> {
    let s = match ch {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'œ' => "oe",
        'æ' => "ae",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Thank   You \n"), "thank you");
    }

    #[test]
    fn strips_apostrophes_and_quotes() {
        assert_eq!(normalize("l'eau"), "leau");
        assert_eq!(normalize("“Merci” l’ ami"), "merci l ami");
    }

    #[test]
    fn folds_french_accents() {
        assert_eq!(normalize("Été à la forêt"), "ete a la foret");
        assert_eq!(normalize("Garçon cœur"), "garcon coeur");
    }

    #[test]
    fn folds_decomposed_accents() {
        assert_eq!(normalize("Cafe\u{301}"), "cafe");
        assert_eq!(normalize("Franc\u{327}ais"), "francais");
        assert_eq!(normalize("Cafe\u{301}"), normalize("Café"));
    }

    #[test]
    fn leaves_other_scripts_alone() {
        assert_eq!(normalize("mbʉ́ nà"), "mbʉ́ na");
    }

    #[test]
    fn language_names_lose_spaces_and_accents() {
        assert_eq!(normalize_language(" Français "), "francais");
        assert_eq!(normalize_language("Ghɔmálá'"), "ghɔmala");
        assert_eq!(normalize_language("Ful fulde"), "fulfulde");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("''"), "");
    }
}
